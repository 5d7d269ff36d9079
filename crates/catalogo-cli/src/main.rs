use std::path::Path;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use catalogo::{Command, Config, HarvestArgs};
use catalogo_client::CatalogClientFactoryEnum;
use catalogo_core::{
    CatalogQuery, DateRange, DirectorySink, HarvestConfig, HarvestService, HttpConfig,
    RunOptions, RunSummary, TargetsConfig, TracingReporter, default_secrets_path,
    load_run_options, load_targets_config, resolve_app_token, select_targets,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::parse();

    match config.command {
        Command::Harvest(args) => handle_harvest(args).await?,
        Command::Targets { config } => {
            let targets = load_targets(config.as_deref())?;
            print_targets(&targets);
        }
    }

    Ok(())
}

fn load_targets(path: Option<&Path>) -> anyhow::Result<TargetsConfig> {
    load_targets_config(path.map(Path::to_path_buf))?.ok_or_else(|| {
        anyhow::anyhow!(
            "No configuration file found. Create ~/.config/catalogo/targets.toml or use --config"
        )
    })
}

/// Date bounds for the run: CLI flags, then the options document, then the
/// `[defaults]` table of the target file.
fn run_options(args: &HarvestArgs, targets: &TargetsConfig) -> RunOptions {
    let base = match &args.options {
        Some(path) => {
            let document = load_run_options(path);
            targets
                .defaults
                .overridden_by(document.published_from, document.published_to)
        }
        None => targets.defaults.clone(),
    };
    base.overridden_by(args.published_from.clone(), args.published_to.clone())
}

async fn handle_harvest(args: HarvestArgs) -> anyhow::Result<()> {
    let targets_config = load_targets(args.config.as_deref())?;

    // Unknown names fail here, before any request.
    let selected = select_targets(&targets_config, args.target.as_deref())
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    if selected.is_empty() {
        info!("No enabled targets found in configuration.");
        info!("Add targets to ~/.config/catalogo/targets.toml or use: catalogo harvest --target <name>");
        return Ok(());
    }

    let options = run_options(&args, &targets_config);
    let range = DateRange::from_options(&options);

    let secrets_path = args.secrets.clone().or_else(default_secrets_path);
    let token = resolve_app_token(args.app_token.as_deref(), secrets_path.as_deref());

    let factory = CatalogClientFactoryEnum::new(
        &HttpConfig::default(),
        &args.discovery_base,
        token.map(|t| t.value),
    )
    .context("Failed to build HTTP client")?;

    let mut harvest_config = HarvestConfig::default().with_per_target_cap(args.limit);
    if let Some(size) = args.page_size {
        harvest_config = harvest_config.with_page_size(size);
    }
    if let Some(pages) = args.max_pages {
        harvest_config = harvest_config.with_max_pages(pages);
    }
    let service = HarvestService::with_config(factory, harvest_config);

    let query = CatalogQuery {
        q: args.q.clone(),
        categories: args.categories.clone(),
        organization: args.organization.clone(),
    };
    let mut sink = DirectorySink::new(&args.output_dir);

    info!("═══════════════════════════════════════════════════════");
    info!("Starting harvest of {} targets", selected.len());
    info!("═══════════════════════════════════════════════════════");

    let outcome = service
        .run_with_progress(&selected, &query, &range, &mut sink, &TracingReporter)
        .await
        .with_context(|| {
            format!(
                "Failed to write catalog files to {}",
                args.output_dir.display()
            )
        })?;

    print_run_summary(&outcome.summary, &args.output_dir);
    Ok(())
}

/// Print per-target counts and the grand total.
fn print_run_summary(summary: &RunSummary, output_dir: &Path) {
    info!("");
    info!("═══════════════════════════════════════════════════════");
    info!("HARVEST COMPLETE");
    info!("═══════════════════════════════════════════════════════");
    for target in &summary.targets {
        if target.unsupported {
            warn!("  {:<20} unsupported platform '{}'", target.name, target.platform);
        } else {
            info!(
                "  {:<20} {:>6} records ({} harvested)",
                target.name, target.retained, target.harvested
            );
        }
    }
    info!("───────────────────────────────────────────────────────");
    info!("  Total records:       {}", summary.total_records());
    info!("  Output directory:    {}", output_dir.display());

    if summary.failed_sources() > 0 {
        info!("───────────────────────────────────────────────────────");
        info!("Truncated sources:");
        for target in &summary.targets {
            for err in target.errors() {
                error!("  - {}: {}", target.name, err);
            }
        }
    }
    info!("═══════════════════════════════════════════════════════");
}

fn print_targets(config: &TargetsConfig) {
    if config.targets.is_empty() {
        println!("No targets configured.");
        return;
    }

    println!();
    for target in &config.targets {
        let state = if target.enabled { "" } else { " (disabled)" };
        println!("{} [{}]{}", target.name, target.platform, state);
        match target.platform {
            catalogo_core::PlatformKind::Registry => {
                println!("   base_url: {}", target.registry_base_url())
            }
            _ if !target.domains.is_empty() => {
                println!("   domains:  {}", target.domains.join(", "))
            }
            _ => {}
        }
        if let Some(desc) = &target.description {
            println!("   {}", desc);
        }
    }
    println!();
}
