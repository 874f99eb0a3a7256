// Dashboard data entry point.
//
// Startup sequence:
// 1. Parse the command line
// 2. Initialize tracing (stderr; stdout is reserved for the JSON output)
// 3. Load config
// 4. Build the league source
// 5. Run the requested command, writing its JSON to stdout

use draftcast_app::cli::{Cli, Command};
use draftcast_app::export::{self, Dataset};
use draftcast_app::output;
use draftcast_app::source::HttpLeagueSource;
use draftcast_app::summary;
use draftcast_core::config::{self, Config};
use draftcast_llm::client::ClaudeClient;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse the command line
    let cli = Cli::parse();

    // 2. Initialize tracing
    init_tracing()?;

    // 3. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={} ({}), {} managers, {} charts",
        config.league.name,
        config.league.id,
        config.league.managers.len(),
        config.charts.len()
    );

    // 4. Build the league source
    let source =
        HttpLeagueSource::from_config(&config.api).context("failed to build league client")?;

    // 5. Run
    match cli.command() {
        Command::Summary => run_summary(&config, &source).await,
        Command::Standings => run_export(&config, &source, Dataset::Standings).await,
        Command::Squads => run_export(&config, &source, Dataset::Squads).await,
    }
}

async fn run_summary(config: &Config, source: &HttpLeagueSource) -> anyhow::Result<()> {
    let credentials = config.require_credentials()?;
    let llm = ClaudeClient::from_config(&config.llm, credentials)
        .context("failed to build Claude client")?;
    info!("Clients ready: league api={}, model={}", config.api.base_url, llm.model());

    let bundle = match summary::assemble(source, &llm, &config.league, &config.charts).await {
        Ok(bundle) => bundle,
        Err(e) => {
            error!("Summary run failed: {}", e);
            return Err(anyhow::Error::new(e).context("summary run failed"));
        }
    };

    output::emit(&bundle, std::io::stdout().lock())
        .context("failed to write summary to stdout")?;

    info!("Summary written for gameweek {}", bundle.gameweek);
    Ok(())
}

async fn run_export(
    config: &Config,
    source: &HttpLeagueSource,
    dataset: Dataset,
) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    if let Err(e) = export::export(source, dataset, &config.league.id, stdout).await {
        error!("Export of {} failed: {}", dataset, e);
        return Err(anyhow::Error::new(e).context(format!("{dataset} export failed")));
    }
    Ok(())
}

/// Initialize tracing to log to stderr so stdout carries only JSON.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("draftcast=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
