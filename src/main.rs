mod commands;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use client::config::{
    ClientConfig, ConfigError, ENV_API_BASE_URL, ENV_LOCALE, ENV_SESSION_FILE, ENV_WS_BASE_URL, normalize_http_url,
    normalize_ws_url,
};
use client::map::MapError;
use client::net::api::ApiError;
use client::state::reports::{DraftError, DraftInput};
use client::state::session::SessionError;
use client::util::i18n::Locale;
use frames::{Category, VoteDirection};
use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("backend request failed: {0}")]
    Api(#[from] ApiError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("invalid report: {0}")]
    Draft(#[from] DraftError),
    #[error("map unavailable: {0}")]
    Map(#[from] MapError),
    #[error("unknown report: {0}")]
    UnknownReport(String),
    #[error("not signed in; run `choufprice login` or `choufprice anon` first")]
    NotSignedIn,
    #[error("stdin read failed: {0}")]
    Stdin(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "choufprice", about = "ChoufPrice community price monitor CLI")]
struct Cli {
    #[arg(long, env = ENV_API_BASE_URL)]
    api_base_url: Option<String>,

    #[arg(long, env = ENV_WS_BASE_URL)]
    ws_base_url: Option<String>,

    #[arg(long, env = ENV_SESSION_FILE)]
    session_file: Option<PathBuf>,

    #[arg(long, env = ENV_LOCALE, value_parser = parse_locale)]
    locale: Option<Locale>,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
    },
    /// Continue as a local anonymous user.
    Anon {
        #[arg(long)]
        name: Option<String>,
    },
    Whoami,
    Logout {
        /// Delete the session file instead of only signing out.
        #[arg(long, default_value_t = false)]
        forget: bool,
    },
    Reports(ReportsCommand),
    /// Reference products and their average prices.
    Catalog {
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Render report clusters through the headless map.
    Map(MapArgs),
    /// Join the community chat. `/delete <id>` removes a message, `/quit` exits.
    Chat,
}

#[derive(Args, Debug)]
struct ReportsCommand {
    #[command(subcommand)]
    command: ReportsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ReportsSubcommand {
    List {
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
        #[arg(long)]
        wilaya: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    Add {
        #[arg(long)]
        product: String,
        #[arg(long)]
        price: i64,
        #[arg(long)]
        city: String,
        #[arg(long)]
        commune: Option<String>,
        /// Reporter display name; defaults to the signed-in user.
        #[arg(long)]
        name: Option<String>,
    },
    Vote {
        id: String,
        #[arg(value_parser = parse_direction)]
        direction: VoteDirection,
    },
    Delete {
        id: String,
    },
    Stats,
    Alerts {
        /// Hide an alert in this and later runs. Repeatable.
        #[arg(long)]
        dismiss: Vec<String>,
    },
    /// Refetch on the configured interval and print what changed.
    Watch {
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
}

#[derive(Args, Debug)]
struct MapArgs {
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,
    #[arg(long, default_value_t = 5)]
    zoom: u8,
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown category `{raw}` (expected one of: {})", known.join(", "))
    })
}

fn parse_locale(raw: &str) -> Result<Locale, String> {
    Locale::parse(raw).ok_or_else(|| format!("unknown locale `{raw}` (expected fr, en or ar)"))
}

fn parse_direction(raw: &str) -> Result<VoteDirection, String> {
    VoteDirection::parse(raw).ok_or_else(|| format!("unknown vote direction `{raw}` (expected up or down)"))
}

/// Environment configuration with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_base_url {
        config.api_base_url = normalize_http_url(ENV_API_BASE_URL, url)?;
    }
    if let Some(url) = &cli.ws_base_url {
        config.ws_base_url = normalize_ws_url(ENV_WS_BASE_URL, url)?;
    }
    if let Some(path) = &cli.session_file {
        config.session_file.clone_from(path);
    }
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let ctx = commands::Context { config: resolve_config(&cli)?, locale: cli.locale };
    match cli.command {
        Command::Login { email, password } => commands::login(&ctx, &email, &password).await,
        Command::Register { email, password, name } => commands::register(&ctx, &email, &password, &name).await,
        Command::Anon { name } => commands::anon(&ctx, name.as_deref()),
        Command::Whoami => commands::whoami(&ctx).await,
        Command::Logout { forget } => commands::logout(&ctx, forget),
        Command::Reports(reports) => run_reports(&ctx, reports).await,
        Command::Catalog { category } => commands::catalog(&ctx, category),
        Command::Map(args) => commands::map(&ctx, args.category, args.zoom).await,
        Command::Chat => commands::chat(&ctx).await,
    }
}

async fn run_reports(ctx: &commands::Context, reports: ReportsCommand) -> Result<(), CliError> {
    match reports.command {
        ReportsSubcommand::List { category, wilaya, search, json } => {
            commands::list_reports(ctx, category, wilaya, search.as_deref(), json).await
        }
        ReportsSubcommand::Add { product, price, city, commune, name } => {
            let input = DraftInput { product_name: product, price, city, commune, reporter_name: name };
            commands::add_report(ctx, &input).await
        }
        ReportsSubcommand::Vote { id, direction } => commands::vote(ctx, &id, direction).await,
        ReportsSubcommand::Delete { id } => commands::delete_report(ctx, &id).await,
        ReportsSubcommand::Stats => commands::stats(ctx).await,
        ReportsSubcommand::Alerts { dismiss } => commands::alerts(ctx, &dismiss).await,
        ReportsSubcommand::Watch { category } => commands::watch(ctx, category).await,
    }
}
