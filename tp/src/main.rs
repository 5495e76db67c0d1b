//! TripPlanner - AI trip itinerary planner
//!
//! CLI entry point for generating, saving and browsing trip plans.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use planstore::{Credentials, Identity, PlanStoreManager, SavedPlan, StoreResult};
use tracing::{debug, info};

use tripplanner::cli::{Cli, Command, OutputFormat, SavedCommand, day_position};
use tripplanner::config::Config;
use tripplanner::domain::{PREDEFINED_INTERESTS, TripCriteria};
use tripplanner::render;
use tripplanner::store::from_saved;
use tripplanner::{PlannerError, PlannerSession, RetryPolicy, Validator, create_client};

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level: tracing::Level = match level {
        Some(level) => level.parse().map_err(|_| eyre!("Invalid log level: {}", level))?,
        None => tracing::Level::INFO,
    };
    let log_file = fs::File::create(log_dir.join("tripplanner.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // CLI level wins over the config file
    setup_logging(cli.log_level.as_deref().or(config.log_level.as_deref())).context("Failed to setup logging")?;

    info!(
        "TripPlanner loaded config: provider={}, model={}, namespace={}",
        config.generation.provider, config.generation.model, config.store.namespace
    );

    // Dispatch command
    match cli.command {
        Command::Plan {
            destination,
            start,
            end,
            interests,
            budget,
            save,
            strict,
            day,
            format,
        } => {
            let criteria = TripCriteria::parse(&destination, &start, &end, interests, &budget)
                .map_err(|e| eyre!("Invalid trip criteria: {}", e))?;
            let day = day_position(day).map_err(|e| eyre!(e))?;
            cmd_plan(&config, criteria, save, strict, day, format).await
        }
        Command::Saved { command } => match command {
            SavedCommand::List { format } => cmd_saved_list(&config, format).await,
            SavedCommand::Show { id, day, format } => {
                let day = day_position(day).map_err(|e| eyre!(e))?;
                cmd_saved_show(&config, &id, day, format).await
            }
            SavedCommand::Watch => cmd_saved_watch(&config).await,
        },
        Command::Interests => cmd_interests(),
        Command::Whoami => cmd_whoami(&config).await,
    }
}

/// Surface a pipeline failure as its user-facing message
fn user_error(e: PlannerError) -> eyre::Report {
    debug!(error = %e, transient = e.is_transient(), "user_error: called");
    if e.is_transient() {
        return eyre!("{}\nThis looks temporary; try again in a moment.", e.user_message());
    }
    eyre!(e.user_message())
}

/// Open the plan store and establish an identity
async fn open_store(config: &Config) -> Result<(PlanStoreManager, Identity)> {
    let store = PlanStoreManager::spawn(&config.store.path, config.store.namespace.clone())
        .context(format!("Failed to open plan store at {}", config.store.path.display()))?;

    let credentials = match config.identity.token() {
        Some(token) => Credentials::Token(token),
        None => Credentials::Anonymous,
    };
    let identity = store.sign_in(credentials).await.context("Failed to establish identity")?;
    Ok((store, identity))
}

/// Generate an itinerary, optionally saving it
async fn cmd_plan(
    config: &Config,
    criteria: TripCriteria,
    save: bool,
    strict: bool,
    day: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let client = create_client(config).map_err(user_error)?;
    let (store, _identity) = open_store(config).await?;
    let validator = if strict || config.validation.strict {
        Validator::strict()
    } else {
        Validator::lenient()
    };
    let session = PlannerSession::new(client, Arc::new(store), validator)
        .with_save_retry(RetryPolicy::from_config(&config.retry));

    if format == OutputFormat::Text {
        eprintln!("{}", format!("Planning your trip to {}...", criteria.destination).dimmed());
    }
    let itinerary = session.generate(criteria.clone()).await.map_err(user_error)?;
    if let Some(index) = day {
        session.select_day(index).map_err(user_error)?;
    }

    match format {
        OutputFormat::Json => {
            let json = render::itinerary_json(Some(&criteria), &itinerary, day);
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            print!("{}", render::render_itinerary(Some(&criteria), &itinerary, day));
        }
    }

    if save {
        let id = session.save().await.map_err(user_error)?;
        eprintln!("{} {}", "Saved plan".green(), id);
    }
    Ok(())
}

/// List saved plans
async fn cmd_saved_list(config: &Config, format: OutputFormat) -> Result<()> {
    let (store, _identity) = open_store(config).await?;
    let plans = store.list().await.map_err(|e| user_error(e.into()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render::plan_list_json(&plans))?),
        OutputFormat::Text => print!("{}", render::render_plan_list(&plans)),
    }
    Ok(())
}

/// Show one saved plan
async fn cmd_saved_show(config: &Config, id: &str, day: Option<usize>, format: OutputFormat) -> Result<()> {
    let (store, _identity) = open_store(config).await?;
    let plan = store.get_required(id).await.map_err(|e| user_error(e.into()))?;
    let (criteria, itinerary) = from_saved(&plan).map_err(|e| user_error(e.into()))?;

    if let Some(index) = day
        && index >= itinerary.len()
    {
        return Err(eyre!("Plan {} has {} days", id, itinerary.len()));
    }

    match format {
        OutputFormat::Json => {
            let json = render::itinerary_json(Some(&criteria), &itinerary, day);
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => print!("{}", render::render_itinerary(Some(&criteria), &itinerary, day)),
    }
    Ok(())
}

/// Print the plan list on every change until Ctrl-C
async fn cmd_saved_watch(config: &Config) -> Result<()> {
    let (store, identity) = open_store(config).await?;
    println!(
        "{} {}",
        "Watching saved plans for".dimmed(),
        identity.user_id.as_str().cyan()
    );

    let subscription = store.subscribe(Box::new(|result: StoreResult<Vec<SavedPlan>>| match result {
        Ok(plans) => {
            println!("{}", "--- saved plans ---".bright_cyan());
            print!("{}", render::render_plan_list(&plans));
        }
        Err(e) => eprintln!("{} {}", "Failed to load saved plans:".red(), e),
    }));

    tokio::signal::ctrl_c().await?;
    debug!("cmd_saved_watch: ctrl_c received, unsubscribing");
    subscription.unsubscribe();
    Ok(())
}

/// Print the predefined interests
fn cmd_interests() -> Result<()> {
    for interest in PREDEFINED_INTERESTS {
        println!("{}", interest);
    }
    Ok(())
}

/// Print the identity and collection path plans are saved under
async fn cmd_whoami(config: &Config) -> Result<()> {
    let (store, identity) = open_store(config).await?;
    println!("User:       {}", identity.user_id);
    println!("Kind:       {}", identity.kind);
    println!("Namespace:  {}", store.namespace());
    if let Some(path) = store.collection_path() {
        println!("Collection: {}", path);
    }
    Ok(())
}
