use anyhow::Context;
use clap::{Parser, Subcommand};
use form_engine::{
    ChromeBrowser, ControlFactory, EngineConfig, EnvironmentConfig, PageBinding, PageCatalog,
    PageHandle, SessionProvider,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "form-engine", version, about = "Check configured form pages against a live browser")]
struct Cli {
    /// Log engine decisions at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify every field and button of one page and print a JSON report
    Check {
        /// Page catalog (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Name of the page in the catalog
        #[arg(long)]
        page: String,

        /// Directory holding environment files
        #[arg(long, default_value = "environments")]
        environments: PathBuf,

        /// Environment name, matched against file stems
        #[arg(long)]
        env: String,

        /// User whose session is used
        #[arg(long)]
        user: String,

        /// Engine configuration (JSON); defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Check {
            catalog,
            page,
            environments,
            env,
            user,
            config,
            headful,
        } => {
            let passed = check(CheckArgs {
                catalog,
                page,
                environments,
                env,
                user,
                config,
                headful,
                debug: cli.debug,
            })
            .await?;
            if !passed {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

struct CheckArgs {
    catalog: PathBuf,
    page: String,
    environments: PathBuf,
    env: String,
    user: String,
    config: Option<PathBuf>,
    headful: bool,
    debug: bool,
}

async fn check(args: CheckArgs) -> anyhow::Result<bool> {
    let catalog = PageCatalog::from_file(&args.catalog)?;
    let descriptor = catalog
        .page(&args.page)
        .with_context(|| format!("page '{}' is not in {}", args.page, args.catalog.display()))?
        .clone();
    let environment = EnvironmentConfig::discover(&args.environments, &args.env)?;
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if args.headful {
        config.browser.headless = false;
    }

    let session = environment.context_for(&args.user).await?;
    let browser = ChromeBrowser::launch(&config.browser)?;
    let tab = browser.new_page()?;
    tab.open_authenticated(&session).await?;

    let binding = PageBinding::new(Arc::new(tab)).with_config(config);
    let mut context = ControlFactory::new(binding).build_page(&descriptor)?;
    context.open(&session.base_url).await?;
    info!(
        "Checking page '{}' as '{}' on '{}'",
        descriptor.name, session.username, environment.name
    );

    let fields = context.check_all_fields(args.debug).await;
    let buttons = context.check_all_buttons(args.debug).await;
    let passed = fields.iter().all(|report| report.passed())
        && buttons.iter().all(|report| report.exists);
    if !passed {
        warn!("Page '{}' has failing checks", descriptor.name);
    }

    let url = context.page().url().await?;
    let report = json!({
        "contextId": context.id(),
        "page": descriptor.name,
        "url": url,
        "environment": environment.name,
        "user": session.username,
        "passed": passed,
        "fields": fields,
        "buttons": buttons,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(passed)
}
