use crate::products::filter::SortKey;
use crate::store::models::{Area, Role};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "skintrack",
    version,
    about = "Skin analysis scores, product catalog filtering and skincare routines"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a default skintrack.toml in the current directory
    Init,
    /// Register a new user account
    Signup(SignupArgs),
    /// Score one analysis snapshot and list its top problems
    Analyze(AnalyzeArgs),
    /// Score every stored analysis for a user, oldest first
    Trend(TrendArgs),
    /// Filter, sort and page through the product catalog
    Products(ProductsArgs),
    /// Products targeting the user's latest top problems
    Recommend(RecommendArgs),
    Saved {
        #[command(subcommand)]
        command: SavedSubcommand,
    },
    Routine {
        #[command(subcommand)]
        command: RoutineSubcommand,
    },
    Admin {
        #[command(subcommand)]
        command: AdminSubcommand,
    },
}

#[derive(Debug, Args, Clone)]
pub struct SignupArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long)]
    pub skin_type: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, conflicts_with = "readings", required_unless_present = "readings")]
    pub user: Option<String>,
    /// JSON array of {"label", "value"} readings
    #[arg(long)]
    pub readings: Option<PathBuf>,
    #[arg(long, value_enum, conflicts_with = "readings")]
    pub area: Option<Area>,
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct TrendArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long, value_enum)]
    pub area: Option<Area>,
}

#[derive(Debug, Args, Clone)]
pub struct PageArgs {
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct ProductsArgs {
    #[arg(long = "type")]
    pub product_type: Option<String>,
    #[arg(long)]
    pub severity: Option<String>,
    #[arg(long)]
    pub skin_type: Option<String>,
    #[arg(long)]
    pub impurity: Option<String>,
    #[arg(long)]
    pub body_part: Option<String>,
    #[arg(long)]
    pub area: Option<String>,
    #[command(flatten)]
    pub paging: PageArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RecommendArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long, value_enum)]
    pub area: Option<Area>,
    #[command(flatten)]
    pub paging: PageArgs,
}

#[derive(Debug, Args, Clone)]
pub struct UserArgs {
    #[arg(long)]
    pub user: String,
}

#[derive(Debug, Args, Clone)]
pub struct SavedProductArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub product: String,
}

#[derive(Debug, Subcommand)]
pub enum SavedSubcommand {
    List(UserArgs),
    Add(SavedProductArgs),
    Remove(SavedProductArgs),
}

#[derive(Debug, Subcommand)]
pub enum RoutineSubcommand {
    List(UserArgs),
    Create(RoutineCreateArgs),
    Update(RoutineUpdateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RoutineCreateArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub name: String,
    /// Product id, in routine order; repeat for each step
    #[arg(long = "step", required = true)]
    pub steps: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct RoutineUpdateArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "step", required = true)]
    pub steps: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum AdminSubcommand {
    AddProduct(AddProductArgs),
    /// Merge a JSON patch into an existing product
    UpdateProduct(UpdateProductArgs),
    RemoveProduct(RemoveProductArgs),
    Users(UserArgs),
    SetRole(SetRoleArgs),
}

#[derive(Debug, Args, Clone)]
pub struct AddProductArgs {
    #[arg(long)]
    pub user: String,
    /// JSON object describing one product
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct RemoveProductArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateProductArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub id: String,
    /// JSON object with the fields to change
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SetRoleArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub target: String,
    #[arg(long, value_enum)]
    pub role: Role,
}
