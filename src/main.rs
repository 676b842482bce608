mod accounts;
mod cli;
mod config;
mod core;
mod products;
mod routines;
mod session;
mod store;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{AdminSubcommand, Cli, Commands, GlobalArgs, PageArgs, RoutineSubcommand, SavedSubcommand};
use config::LoadedConfig;
use crate::core::AnalysisOptions;
use crate::core::report::AnalysisSource;
use products::Product;
use products::filter::{FilterSet, RawFilters, paginate};
use serde::Serialize;
use serde::de::DeserializeOwned;
use session::Session;
use std::fs;
use std::path::Path;
use store::{DataStore, FileStore, StoreError};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    init_tracing();

    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            if let Some(store_err) = err.chain().find_map(|cause| cause.downcast_ref::<StoreError>())
            {
                eprintln!("-> hint: {}", store_err.hint());
            }
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    let config_path = if matches!(cli.command, Commands::Init) {
        if cli.global.config.is_some() {
            eprintln!("warning: --config is ignored by `skintrack init`; writing ./skintrack.toml");
        }
        None
    } else {
        cli.global.config.as_deref()
    };

    let loaded = config::load_config(config_path, &cwd)?;
    let json = cli.global.json || loaded.config.general.json;
    let opts = AnalysisOptions::from_config(&loaded.config);

    match cli.command {
        Commands::Init => {
            let path = cwd.join(config::CONFIG_FILE_NAME);
            config::write_default_config(&path)?;
            println!("created {}", path.display());
        }
        Commands::Signup(args) => {
            let store = open_store(&cli.global, &loaded)?;
            let session = accounts::sign_up(
                &store,
                accounts::NewUser {
                    id: args.id,
                    email: args.email,
                    name: args.name,
                    skin_type: args.skin_type,
                },
            )?;
            emit(json, session.user(), |user| println!("signed up {}", user.id))?;
        }
        Commands::Analyze(args) => {
            let catalog_path = loaded
                .config
                .analysis
                .catalog_file
                .as_deref()
                .map(|path| loaded.resolve(path));
            let catalog = core::load_catalog(catalog_path.as_deref())?;
            let opts = opts.with_top_n(args.top);

            let report = match (&args.readings, &args.user) {
                (Some(path), _) => {
                    let readings = core::load_readings_file(path)?;
                    core::analyze(&readings, &catalog, opts, None)
                }
                (None, Some(user_id)) => {
                    let store = open_store(&cli.global, &loaded)?;
                    let session = Session::sign_in(&store, user_id)?;
                    let analysis = core::latest_analysis(&store, &session, args.area)?;
                    let source = AnalysisSource::from(&analysis);
                    let readings = core::readings::ReadingSet::new(analysis.readings)
                        .with_context(|| format!("analysis {} is malformed", source.analysis_id))?;
                    core::analyze(&readings, &catalog, opts, Some(source))
                }
                (None, None) => anyhow::bail!("pass --user or --readings"),
            };
            emit(json, &report, core::report::print_analysis)?;
        }
        Commands::Trend(args) => {
            let store = open_store(&cli.global, &loaded)?;
            let session = Session::sign_in(&store, &args.user)?;
            let points = core::score_trend(&store, &session, args.area, opts)?;
            emit(json, &points, |points| core::report::print_trend(points))?;
        }
        Commands::Products(args) => {
            let store = open_store(&cli.global, &loaded)?;
            let filters = FilterSet::from_raw(RawFilters {
                product_type: args.product_type,
                severity: args.severity,
                skin_type: args.skin_type,
                impurity: args.impurity,
                body_part: args.body_part,
                area: args.area,
            })?;
            let (sort, page_size) = paging(&args.paging, &loaded);
            let page = products::browse(&store, &filters, sort, args.paging.page, page_size)?;
            emit(json, &page, core::report::print_product_page)?;
        }
        Commands::Recommend(args) => {
            let store = open_store(&cli.global, &loaded)?;
            let session = Session::sign_in(&store, &args.user)?;
            let analysis = core::latest_analysis(&store, &session, args.area)?;
            let readings = core::readings::ReadingSet::new(analysis.readings)?;
            let problems = core::problems::top_problems(
                readings.as_slice(),
                opts.top_n,
                opts.severity.thresholds(),
            );

            let (sort, page_size) = paging(&args.paging, &loaded);
            let catalog = products::fetch_products(&store)?;
            let recommended = products::recommend(
                &catalog,
                &problems,
                session.user().skin_type.as_deref(),
                sort,
            );
            if recommended.is_empty() {
                warn!(user = session.user_id(), "no products match the latest top problems");
            }
            let page = paginate(recommended, args.paging.page, page_size)?;
            emit(json, &page, core::report::print_product_page)?;
        }
        Commands::Saved { command } => {
            let store = open_store(&cli.global, &loaded)?;
            match command {
                SavedSubcommand::List(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    let saved = products::list_saved(&store, &session)?;
                    emit(json, &saved, |saved| core::report::print_products(saved))?;
                }
                SavedSubcommand::Add(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    let entry = products::save_product(&store, &session, &args.product)?;
                    emit(json, &entry, |entry| println!("saved {}", entry.product_id))?;
                }
                SavedSubcommand::Remove(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    products::unsave_product(&store, &session, &args.product)?;
                    emit(json, &args.product, |product| println!("removed {product}"))?;
                }
            }
        }
        Commands::Routine { command } => {
            let store = open_store(&cli.global, &loaded)?;
            match command {
                RoutineSubcommand::List(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    let list = routines::list_routines(&store, &session)?;
                    emit(json, &list, |list| core::report::print_routines(list))?;
                }
                RoutineSubcommand::Create(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    let created = routines::create_routine(&store, &session, &args.name, &args.steps)?;
                    emit(json, &created, |created| {
                        core::report::print_routines(std::slice::from_ref(created))
                    })?;
                }
                RoutineSubcommand::Update(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    let updated = routines::update_routine(
                        &store,
                        &session,
                        &args.id,
                        args.name.as_deref(),
                        &args.steps,
                    )?;
                    emit(json, &updated, |updated| {
                        core::report::print_routines(std::slice::from_ref(updated))
                    })?;
                }
            }
        }
        Commands::Admin { command } => {
            let store = open_store(&cli.global, &loaded)?;
            match command {
                AdminSubcommand::AddProduct(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    let product: Product = read_json(&args.file)?;
                    products::add_product(&store, &session, &product)?;
                    emit(json, &product, |product| println!("added {}", product.id))?;
                }
                AdminSubcommand::UpdateProduct(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    let patch: serde_json::Value = read_json(&args.file)?;
                    let product = products::update_product(&store, &session, &args.id, patch)?;
                    emit(json, &product, |product| println!("updated {}", product.id))?;
                }
                AdminSubcommand::RemoveProduct(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    products::remove_product(&store, &session, &args.id)?;
                    emit(json, &args.id, |id| println!("removed {id}"))?;
                }
                AdminSubcommand::Users(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    let users = accounts::list_users(&store, &session)?;
                    emit(json, &users, |users| core::report::print_users(users))?;
                }
                AdminSubcommand::SetRole(args) => {
                    let session = Session::sign_in(&store, &args.user)?;
                    let user = accounts::set_role(&store, &session, &args.target, args.role)?;
                    emit(json, &user, |user| println!("{} is now {}", user.id, user.role))?;
                }
            }
        }
    }

    Ok(0)
}

fn open_store(global: &GlobalArgs, loaded: &LoadedConfig) -> Result<FileStore> {
    let data_dir = match &global.data_dir {
        Some(dir) => dir.clone(),
        None => loaded.resolve(&loaded.config.general.data_dir),
    };
    let store = FileStore::open(&data_dir)?;
    tracing::debug!(store = store.name(), dir = %data_dir.display(), "store ready");
    Ok(store)
}

fn paging(args: &PageArgs, loaded: &LoadedConfig) -> (products::filter::SortKey, usize) {
    (
        args.sort.unwrap_or(loaded.config.products.sort),
        args.page_size.unwrap_or(loaded.config.products.page_size),
    )
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(StoreError::from)
        .with_context(|| format!("failed parsing {}", path.display()))
}

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, human: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}
