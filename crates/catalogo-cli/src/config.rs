use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::LazyLock;

static VERSION_INFO: LazyLock<String> = LazyLock::new(|| {
    let version = env!("CARGO_PKG_VERSION");

    // Use VERGEN_GIT_SHA for the commit hash (with safe slicing)
    let commit = option_env!("VERGEN_GIT_SHA")
        .map(|s| s.chars().take(7).collect::<String>())
        .unwrap_or_else(|| "unknown".to_string());

    let built = option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown"); // YYYY-MM-DD
    let target = option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown");
    let rustc = option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown");

    format!("{version}\ncommit: {commit}\nbuilt: {built}\ntarget: {target}\nrustc: {rustc}")
});

pub fn version_info() -> &'static str {
    &VERSION_INFO
}

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "catalogo")]
#[command(
    author,
    version = version_info(),
    about = "Harvests open data catalogs (Socrata Discovery, CKAN) into JSON and CSV"
)]
#[command(after_help = "Examples:
  catalogo harvest
  catalogo harvest --target colombia --q salud --limit 200
  catalogo harvest --published-from 2023-01-01 --output-dir out
  catalogo targets

Credentials:
  SOCRATA_APP_TOKEN, --app-token or a secrets file (~/.config/catalogo/secrets.json)")]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Harvest catalog records from configured targets
    #[command(after_help = "Examples:
  catalogo harvest                                   # All enabled targets
  catalogo harvest --target mexico                   # One target by name
  catalogo harvest --categories Salud,Educación      # Category / group filters
  catalogo harvest --config ~/custom.toml            # Custom target file
  catalogo harvest --published-to 2024/12/31         # Date window (inclusive)")]
    Harvest(HarvestArgs),
    /// List configured targets
    Targets {
        /// Custom path to targets.toml (or a legacy .json target map)
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct HarvestArgs {
    /// Harvest only this target (name from the configuration, case-insensitive)
    #[arg(short, long, value_name = "NAME")]
    pub target: Option<String>,

    /// Free-text search query
    #[arg(long, value_name = "TEXT")]
    pub q: Option<String>,

    /// Comma-separated categories (Discovery) or groups (CKAN)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub categories: Vec<String>,

    /// CKAN organization slug
    #[arg(long, value_name = "SLUG")]
    pub organization: Option<String>,

    /// Maximum records per harvest unit (domain or registry)
    #[arg(short, long, default_value_t = 1000)]
    pub limit: usize,

    /// Keep only records published on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub published_from: Option<String>,

    /// Keep only records published on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub published_to: Option<String>,

    /// Custom path to targets.toml (or a legacy .json target map)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run options document (JSON or TOML) with default date bounds
    #[arg(long, value_name = "PATH")]
    pub options: Option<PathBuf>,

    /// Directory for the per-target JSON and CSV files
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Socrata app token (overrides SOCRATA_APP_TOKEN and the secrets file)
    #[arg(long, value_name = "TOKEN")]
    pub app_token: Option<String>,

    /// Secrets file holding the app token
    #[arg(long, value_name = "PATH")]
    pub secrets: Option<PathBuf>,

    /// Discovery API endpoint
    #[arg(
        long,
        env = "SOCRATA_DISCOVERY_BASE",
        default_value = catalogo_core::DEFAULT_DISCOVERY_BASE
    )]
    pub discovery_base: String,

    /// Page size (clamped to each API's maximum)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Maximum pages requested per harvest unit
    #[arg(long)]
    pub max_pages: Option<usize>,
}
