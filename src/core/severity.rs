use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    /// Ordinal used by the catalog sort keys. Missing severity ranks as 0.
    pub fn rank(self) -> u8 {
        match self {
            Self::Mild => 1,
            Self::Moderate => 2,
            Self::Severe => 3,
        }
    }

    pub fn colored(self) -> ColoredString {
        match self {
            Self::Severe => self.as_str().red().bold(),
            Self::Moderate => self.as_str().yellow().bold(),
            Self::Mild => self.as_str().green().bold(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mild" => Ok(Self::Mild),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            other => Err(format!(
                "unknown severity `{other}` (expected mild, moderate or severe)"
            )),
        }
    }
}

/// Named threshold sets for the severity classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SeverityPreset {
    #[default]
    Dashboard,
    Admin,
}

impl SeverityPreset {
    pub fn thresholds(self) -> SeverityThresholds {
        match self {
            Self::Dashboard => SeverityThresholds {
                severe: 75.0,
                moderate: 50.0,
            },
            Self::Admin => SeverityThresholds {
                severe: 80.0,
                moderate: 60.0,
            },
        }
    }
}

impl fmt::Display for SeverityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dashboard => write!(f, "dashboard"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityThresholds {
    pub severe: f64,
    pub moderate: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        SeverityPreset::default().thresholds()
    }
}

pub fn classify_severity(value: f64, thresholds: SeverityThresholds) -> Severity {
    if value >= thresholds.severe {
        Severity::Severe
    } else if value >= thresholds.moderate {
        Severity::Moderate
    } else {
        Severity::Mild
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
}

impl ColorToken {
    pub fn paint(self, text: &str) -> ColoredString {
        match self {
            Self::Red => text.red(),
            Self::Orange => text.truecolor(255, 165, 0),
            Self::Yellow => text.yellow(),
            Self::Green => text.green(),
            Self::Blue => text.blue(),
        }
    }
}

/// Display color scales. The two scales use different cut points and are
/// both in use, so neither is derived from the other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ColorPreset {
    #[default]
    FourTierStrict,
    FourTierLoose,
}

impl fmt::Display for ColorPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FourTierStrict => write!(f, "four-tier-strict"),
            Self::FourTierLoose => write!(f, "four-tier-loose"),
        }
    }
}

pub fn color_for_value(value: f64, preset: ColorPreset) -> ColorToken {
    match preset {
        ColorPreset::FourTierStrict => {
            if value >= 80.0 {
                ColorToken::Red
            } else if value >= 60.0 {
                ColorToken::Orange
            } else if value >= 40.0 {
                ColorToken::Yellow
            } else {
                ColorToken::Green
            }
        }
        ColorPreset::FourTierLoose => {
            if value >= 75.0 {
                ColorToken::Red
            } else if value >= 50.0 {
                ColorToken::Yellow
            } else if value >= 25.0 {
                ColorToken::Green
            } else {
                ColorToken::Blue
            }
        }
    }
}
