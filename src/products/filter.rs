use crate::core::severity::Severity;
use crate::products::Product;
use crate::store::StoreError;
use crate::store::models::Area;
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub const ALL: &str = "all";

static SKIN_TYPE_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("valid skin type separator regex"));

/// Per-field constraints. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSet {
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub severity: Option<Severity>,
    pub skin_type: Option<String>,
    pub impurity: Option<String>,
    pub body_part: Option<String>,
    pub area: Option<Area>,
}

/// Raw filter values as typed by a user; `"all"` and blanks mean no constraint.
#[derive(Debug, Clone, Default)]
pub struct RawFilters {
    pub product_type: Option<String>,
    pub severity: Option<String>,
    pub skin_type: Option<String>,
    pub impurity: Option<String>,
    pub body_part: Option<String>,
    pub area: Option<String>,
}

impl FilterSet {
    pub fn from_raw(raw: RawFilters) -> Result<Self, StoreError> {
        let severity = constraint(raw.severity)
            .map(|value| value.parse::<Severity>().map_err(StoreError::Validation))
            .transpose()?;
        let area = constraint(raw.area)
            .map(|value| {
                Area::from_str(&value, true)
                    .map_err(|_| StoreError::Validation(format!("unknown area `{value}`")))
            })
            .transpose()?;

        Ok(Self {
            product_type: constraint(raw.product_type),
            severity,
            skin_type: constraint(raw.skin_type),
            impurity: constraint(raw.impurity),
            body_part: constraint(raw.body_part),
            area,
        })
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(product_type) = &self.product_type
            && &product.product_type != product_type
        {
            return false;
        }
        if let Some(severity) = self.severity
            && product.severity() != Some(severity)
        {
            return false;
        }
        if let Some(skin_type) = &self.skin_type
            && !has_skin_type(&product.skin_type, skin_type)
        {
            return false;
        }
        if let Some(impurity) = &self.impurity
            && &product.impurity != impurity
        {
            return false;
        }
        if let Some(body_part) = &self.body_part
            && product.body_part() != Some(body_part.as_str())
        {
            return false;
        }
        if let Some(area) = self.area
            && product.area() != area
        {
            return false;
        }
        true
    }
}

fn constraint(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case(ALL))
}

/// Membership test against a single or comma-separated skin type field.
pub fn has_skin_type(field: &str, wanted: &str) -> bool {
    SKIN_TYPE_SPLIT_RE
        .split(field.trim())
        .any(|token| !token.is_empty() && token.eq_ignore_ascii_case(wanted.trim()))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    NameAsc,
    NameDesc,
    SeverityAsc,
    SeverityDesc,
    DateAsc,
    #[default]
    DateDesc,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::SeverityAsc => "severity-asc",
            Self::SeverityDesc => "severity-desc",
            Self::DateAsc => "date-asc",
            Self::DateDesc => "date-desc",
        };
        f.write_str(name)
    }
}

impl SortKey {
    pub fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::NameAsc => compare_names(a, b),
            Self::NameDesc => compare_names(b, a),
            Self::SeverityAsc => severity_rank(a).cmp(&severity_rank(b)),
            Self::SeverityDesc => severity_rank(b).cmp(&severity_rank(a)),
            Self::DateAsc => a.created_at.cmp(&b.created_at),
            Self::DateDesc => b.created_at.cmp(&a.created_at),
        }
    }
}

fn compare_names(a: &Product, b: &Product) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

fn severity_rank(product: &Product) -> u8 {
    product.severity().map_or(0, Severity::rank)
}

pub fn filter_and_sort(products: &[Product], filters: &FilterSet, sort: SortKey) -> Vec<Product> {
    let mut selected: Vec<Product> = products
        .iter()
        .filter(|product| filters.matches(product))
        .cloned()
        .collect();
    selected.sort_by(|a, b| sort.compare(a, b));
    selected
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slices one page out of `items`. The requested page is clamped into
/// `1..=max(total_pages, 1)`.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Result<Page<T>, StoreError> {
    if page_size == 0 {
        return Err(StoreError::Validation("page size must be at least 1".to_string()));
    }

    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));
    let start = (page - 1) * page_size;

    let items = items.into_iter().skip(start).take(page_size).collect();

    Ok(Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    })
}
