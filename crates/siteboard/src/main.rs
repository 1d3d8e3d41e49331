//! siteboard - Connected website dashboard

mod cli;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use siteboard_core::types::ContentKind;
use siteboard_core::{
    content_totals, needs_setup, setup_prompt, top_content, usage_summary, ApiClient, CoreError,
    Effect, ErrorSeverity, EventBus, LoadedSnapshot, ManageOutcome, SetupInstructions, SiteEvent,
    SiteboardConfig, SnapshotStore, SubscriptionGatekeeper, SyncGatekeeper, SyncOutcome,
    UpgradeOutcome, UserFacingError,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "siteboard",
    version,
    about = "Connected website dashboard",
    long_about = "Inspect and act on websites connected through the WordPress plugin or Shopify app.\n\
                  \n\
                  Examples:\n\
                    siteboard status site_123          # Plan, quota usage and redirect stats\n\
                    siteboard content site_123 --top 5 # Top content by AI redirects\n\
                    siteboard setup site_123           # Onboarding steps and access key\n\
                    siteboard sync site_123            # Open the plugin/app to push content\n\
                    siteboard manage site_123          # Billing portal (Pro) or upgrade offer\n\
                    siteboard upgrade site_123         # Start a Pro checkout\n\
                  \n\
                  Environment Variables:\n\
                    SITEBOARD_CONFIG                   # Config file path\n\
                    SITEBOARD_API_URL                  # Override API base URL\n\
                    SITEBOARD_APP_ORIGIN               # Override web app origin\n\
                    SITEBOARD_LOG                      # Log filter (default: warn)\n\
                    SITEBOARD_NO_COLOR                 # Disable ANSI colors"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: <config dir>/siteboard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the product API
    #[arg(long, global = true, env = "SITEBOARD_API_URL")]
    api_url: Option<String>,

    /// Origin of the web app (checkout callbacks, chat links)
    #[arg(long, global = true, env = "SITEBOARD_APP_ORIGIN")]
    app_origin: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "SITEBOARD_NO_COLOR")]
    no_color: bool,

    /// Print URLs instead of opening them
    #[arg(long, global = true)]
    no_open: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show plan, quota usage and redirect statistics
    Status {
        /// Website identifier
        website_id: String,
    },
    /// List synced content
    Content {
        /// Website identifier
        website_id: String,
        /// Only one kind: product, post or page
        #[arg(long, short = 'k')]
        kind: Option<String>,
        /// Top N items by AI redirects, across all kinds
        #[arg(long, short = 'n')]
        top: Option<usize>,
    },
    /// Show onboarding instructions
    Setup {
        /// Website identifier
        website_id: String,
    },
    /// Open the plugin/app that pushes content
    Sync {
        /// Website identifier
        website_id: String,
    },
    /// Open the billing portal (Pro) or show the upgrade offer
    Manage {
        /// Website identifier
        website_id: String,
    },
    /// Start a checkout for the Pro plan
    Upgrade {
        /// Website identifier
        website_id: String,
    },
}

/// Flags shared by all command handlers
#[derive(Clone, Copy)]
struct Output {
    json: bool,
    no_color: bool,
    no_open: bool,
}

/// Wired collaborators for one invocation
struct App {
    config: SiteboardConfig,
    client: Arc<ApiClient>,
    store: SnapshotStore,
    event_bus: EventBus,
}

impl App {
    fn new(config: SiteboardConfig) -> Result<Self> {
        let client = Arc::new(ApiClient::from_config(&config)?);
        let event_bus = EventBus::default();
        spawn_event_logger(&event_bus);
        let store = SnapshotStore::new(client.clone(), event_bus.clone());
        Ok(Self {
            config,
            client,
            store,
            event_bus,
        })
    }

    async fn load(&self, website_id: &str) -> Result<LoadedSnapshot> {
        self.store
            .load(website_id)
            .await
            .map_err(|e| user_error(&e))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config =
        SiteboardConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(api_url) = cli.api_url {
        config.api_base_url = api_url;
    }
    if let Some(app_origin) = cli.app_origin {
        config.app_origin = app_origin;
    }
    config.validate().context("Invalid configuration")?;
    debug!(api = %config.api_base_url, origin = %config.origin(), "Configuration loaded");

    let out = Output {
        json: cli.json,
        no_color: cli.no_color,
        no_open: cli.no_open,
    };
    let app = App::new(config)?;

    match cli.command {
        Command::Status { website_id } => run_status(&app, &website_id, out).await,
        Command::Content {
            website_id,
            kind,
            top,
        } => run_content(&app, &website_id, kind, top, out).await,
        Command::Setup { website_id } => run_setup(&app, &website_id, out).await,
        Command::Sync { website_id } => run_sync(&app, &website_id, out).await,
        Command::Manage { website_id } => run_manage(&app, &website_id, out).await,
        Command::Upgrade { website_id } => run_upgrade(&app, &website_id, out).await,
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SITEBOARD_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Log every site event at debug level until the bus closes
fn spawn_event_logger(event_bus: &EventBus) {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn log_event(event: &SiteEvent) {
    let website_id = event.website_id();
    let action = event.action();
    match event {
        SiteEvent::SnapshotLoaded { needs_setup, .. } => {
            debug!(website_id, needs_setup, "Snapshot loaded");
        }
        SiteEvent::SnapshotFailed { message, .. } => {
            debug!(website_id, %message, "Snapshot failed");
        }
        SiteEvent::SyncDispatched { url, .. } | SiteEvent::BillingRedirect { url, .. } => {
            debug!(website_id, ?action, %url, "Redirect issued");
        }
        SiteEvent::BillingFailed { message, .. } => {
            debug!(website_id, ?action, %message, "Billing failed");
        }
        SiteEvent::ActionRejected { .. } => {
            debug!(website_id, ?action, "Duplicate action rejected");
        }
    }
}

/// Turn a core error into the message shown to the user
fn user_error(error: &CoreError) -> anyhow::Error {
    let user = UserFacingError::from_core_error(error);
    anyhow::anyhow!(cli::format_user_error(&user))
}

/// Print a notice and carry on, or fail with anything more severe
fn report(error: &CoreError) -> Result<()> {
    let user = UserFacingError::from_core_error(error);
    match user.severity {
        ErrorSeverity::Notice => {
            println!("{}", cli::format_user_error(&user));
            Ok(())
        }
        ErrorSeverity::Error | ErrorSeverity::Fatal => {
            Err(anyhow::anyhow!(cli::format_user_error(&user)))
        }
    }
}

/// Open the effect's URL, or just print it with `--no-open`
///
/// JSON output already carries the URL, so nothing extra is printed there.
fn perform(effect: &Effect, out: Output) {
    if out.no_open {
        if !out.json {
            println!("{}", effect.url());
        }
        return;
    }

    if !out.json {
        println!("Opening {}", effect.url());
    }
    if let Err(e) = open::that(effect.url()) {
        warn!(url = %effect.url(), error = %e, "Failed to open browser");
        eprintln!("Could not open a browser. Visit: {}", effect.url());
    }
}

// ============================================================================
// Command Handlers
// ============================================================================

async fn run_status(app: &App, website_id: &str, out: Output) -> Result<()> {
    let loaded = app.load(website_id).await?;
    let summary = usage_summary(&loaded.snapshot, &app.config.alerts);
    let totals = content_totals(&loaded.snapshot);

    let report = cli::StatusReport {
        snapshot: &loaded.snapshot,
        needs_setup: loaded.needs_setup,
        summary: &summary,
        totals: &totals,
        origin: app.config.origin(),
    };
    println!("{}", cli::format_status(&report, out.json, out.no_color));
    Ok(())
}

async fn run_content(
    app: &App,
    website_id: &str,
    kind: Option<String>,
    top: Option<usize>,
    out: Output,
) -> Result<()> {
    let kind = match kind {
        Some(raw) => match ContentKind::parse(&raw) {
            Some(kind) => Some(kind),
            None => bail!("Unknown content kind '{}' (expected product, post or page)", raw),
        },
        None => None,
    };

    let loaded = app.load(website_id).await?;
    let snapshot = &loaded.snapshot;

    let items: Vec<_> = match (kind, top) {
        (_, Some(n)) => top_content(snapshot, n)
            .into_iter()
            .filter(|item| kind.is_none_or(|k| item.kind() == k))
            .collect(),
        (Some(k), None) => snapshot.content.items(k).iter().collect(),
        (None, None) => snapshot.content.iter().collect(),
    };

    println!(
        "{}",
        cli::format_content_table(&items, &snapshot.domain, out.json, out.no_color)
    );
    Ok(())
}

async fn run_setup(app: &App, website_id: &str, out: Output) -> Result<()> {
    let loaded = app.load(website_id).await?;
    let snapshot = &loaded.snapshot;

    if !needs_setup(snapshot) {
        println!("{}", cli::format_already_synced(snapshot, out.json));
        return Ok(());
    }

    let instructions = SetupInstructions::new(&app.config.install_targets);
    match setup_prompt(snapshot, &instructions) {
        Some(prompt) => {
            println!("{}", cli::format_setup_prompt(&prompt, out.json));
            Ok(())
        }
        None => bail!(
            "No setup instructions for integration kind '{}'",
            snapshot.kind
        ),
    }
}

async fn run_sync(app: &App, website_id: &str, out: Output) -> Result<()> {
    let loaded = app.load(website_id).await?;
    let snapshot = &loaded.snapshot;

    let instructions = SetupInstructions::new(&app.config.install_targets);
    let gatekeeper = SyncGatekeeper::new(instructions.clone(), app.event_bus.clone());

    // Held until the install target has been opened
    let pending = gatekeeper.begin_sync(snapshot);
    let outcome = pending.outcome();
    match outcome {
        SyncOutcome::Dispatched(effect) => {
            if out.json {
                println!("{}", cli::format_action_json("dispatched", Some(effect.url())));
            }
            perform(effect, out);
        }
        SyncOutcome::NeedsSetup => match setup_prompt(snapshot, &instructions) {
            Some(prompt) => println!("{}", cli::format_setup_prompt(&prompt, out.json)),
            None => println!("Setup required before syncing."),
        },
        SyncOutcome::Failed(_) | SyncOutcome::Busy => {
            if let Some(err) = outcome.error(snapshot) {
                report(&err)?;
            }
        }
    }
    pending.complete();
    Ok(())
}

async fn run_manage(app: &App, website_id: &str, out: Output) -> Result<()> {
    let loaded = app.load(website_id).await?;
    let gatekeeper = SubscriptionGatekeeper::new(
        app.client.clone(),
        app.config.origin(),
        app.event_bus.clone(),
    );

    match gatekeeper.request_manage(&loaded.snapshot).await {
        ManageOutcome::OpenPortal(url) => {
            if out.json {
                println!("{}", cli::format_action_json("portal", Some(&url)));
            }
            perform(&Effect::NavigateTo(url), out);
            Ok(())
        }
        ManageOutcome::ShowUpgradeOffer(offer) => {
            println!(
                "{}",
                cli::format_upgrade_offer(&offer, website_id, out.json)
            );
            Ok(())
        }
        outcome @ (ManageOutcome::Failed(_) | ManageOutcome::Busy) => {
            match outcome.error(website_id) {
                Some(err) => report(&err),
                None => Ok(()),
            }
        }
    }
}

async fn run_upgrade(app: &App, website_id: &str, out: Output) -> Result<()> {
    let loaded = app.load(website_id).await?;
    let gatekeeper = SubscriptionGatekeeper::new(
        app.client.clone(),
        app.config.origin(),
        app.event_bus.clone(),
    );

    match gatekeeper.request_upgrade(&loaded.snapshot).await {
        UpgradeOutcome::OpenCheckout(url) => {
            if out.json {
                println!("{}", cli::format_action_json("checkout", Some(&url)));
            }
            perform(&Effect::NavigateTo(url), out);
            Ok(())
        }
        UpgradeOutcome::AlreadyPro => {
            if out.json {
                println!("{}", cli::format_action_json("already_pro", None));
            } else {
                println!(
                    "{} is already on the Pro plan. Use `siteboard manage {}` to change billing.",
                    loaded.snapshot.name, website_id
                );
            }
            Ok(())
        }
        outcome @ (UpgradeOutcome::Failed(_) | UpgradeOutcome::Busy) => {
            match outcome.error(website_id) {
                Some(err) => report(&err),
                None => Ok(()),
            }
        }
    }
}
