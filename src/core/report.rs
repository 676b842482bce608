use crate::core::severity::{ColorPreset, ColorToken, Severity, SeverityPreset};
use crate::products::filter::Page;
use crate::products::{AreaDetails, Product};
use crate::routines::RoutineDetail;
use crate::store::models::{Area, Role, SkinAnalysis, User};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ProblemLine {
    pub label: String,
    pub value: f64,
    pub severity: Severity,
    pub color: ColorToken,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpurityLine {
    pub label: String,
    pub value: f64,
    pub color: ColorToken,
    pub image: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSource {
    pub analysis_id: String,
    pub area: Area,
    pub created_at: DateTime<Utc>,
}

impl From<&SkinAnalysis> for AnalysisSource {
    fn from(analysis: &SkinAnalysis) -> Self {
        Self {
            analysis_id: analysis.id.clone(),
            area: analysis.area,
            created_at: analysis.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub score: i32,
    pub label: String,
    pub top_problems: Vec<ProblemLine>,
    pub impurities: Vec<ImpurityLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<AnalysisSource>,
    pub severity_preset: SeverityPreset,
    pub color_preset: ColorPreset,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub analysis_id: String,
    pub area: Area,
    pub created_at: DateTime<Utc>,
    pub score: i32,
    pub label: String,
}

pub fn print_analysis(report: &AnalysisReport) {
    println!("Skin Score: {}/100 ({})", report.score, report.label);
    if let Some(source) = &report.source {
        println!(
            "analysis {} ({}, {})",
            source.analysis_id,
            source.area,
            source.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    if report.top_problems.is_empty() {
        println!("{}", "No problems detected".green().bold());
    } else {
        println!("{} ({})", "TOP PROBLEMS".bold(), report.top_problems.len());
        for problem in &report.top_problems {
            println!(
                "[{}] {} {}",
                problem.severity.colored(),
                problem.label,
                problem.color.paint(&format!("{:.0}%", problem.value))
            );
        }
    }

    if !report.impurities.is_empty() {
        println!();
        println!("{} ({})", "IMPURITIES".bold(), report.impurities.len());
        for impurity in &report.impurities {
            println!(
                "{} {}",
                impurity.label,
                impurity.color.paint(&format!("{:.0}%", impurity.value))
            );
            println!("-> {}", impurity.description);
        }
    }

    println!();
    println!(
        "thresholds: severity={} color={}",
        report.severity_preset, report.color_preset
    );
}

pub fn print_trend(points: &[TrendPoint]) {
    if points.is_empty() {
        println!("no analyses recorded");
        return;
    }

    for point in points {
        println!(
            "{} {:<4} {:>4} ({}) [{}]",
            point.created_at.format("%Y-%m-%d"),
            point.area,
            point.score,
            point.label,
            point.analysis_id
        );
    }

    if let (Some(first), Some(last)) = (points.first(), points.last())
        && points.len() > 1
    {
        let delta = last.score - first.score;
        let line = format!("change: {delta:+}");
        if delta >= 0 {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }
}

pub fn print_product_page(page: &Page<Product>) {
    if page.items.is_empty() {
        println!("no products match");
        return;
    }

    for product in &page.items {
        print_product_line(product);
    }
    println!();
    println!(
        "page {}/{} ({} products)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
}

pub fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("no products");
        return;
    }
    for product in products {
        print_product_line(product);
    }
}

fn print_product_line(product: &Product) {
    let detail = match &product.area {
        AreaDetails::Face { severity } => format!("face, {}", severity.colored()),
        AreaDetails::Body { body_part } => format!("body, {body_part}"),
    };
    println!(
        "{} {} ({}) [{}]",
        product.id.dimmed(),
        product.name.bold(),
        product.product_type,
        detail
    );
    if !product.impurity.is_empty() || !product.skin_type.is_empty() {
        println!(
            "-> for {} / skin: {}",
            display_or_dash(&product.impurity),
            display_or_dash(&product.skin_type)
        );
    }
}

pub fn print_routines(routines: &[RoutineDetail]) {
    if routines.is_empty() {
        println!("no routines");
        return;
    }

    for detail in routines {
        println!("{} {}", detail.routine.id.dimmed(), detail.routine.name.bold());
        for step in &detail.steps {
            println!("  {}. {} ({})", step.step_order, step.product_name, step.product_id);
        }
    }
}

pub fn print_users(users: &[User]) {
    for user in users {
        let role = match user.role {
            Role::Admin => user.role.as_str().bold(),
            Role::User => user.role.as_str().normal(),
        };
        println!(
            "{:<12} {:<28} {:<6} skin: {}",
            user.id,
            user.email,
            role,
            display_or_dash(user.skin_type.as_deref().unwrap_or_default())
        );
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
