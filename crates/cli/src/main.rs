//! smokefree CLI - recovery milestone tracker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use smokefree_core::{
    Clock, HealthOverview, Milestone, MilestoneKind, RegressionEvent, SessionContext, SystemClock,
    Time,
};
use smokefree_source::{HttpSource, JsonStateStore, LocalSource, MilestoneSource, SourceState};
use smokefree_sync::{DataOrigin, HealthSession, SyncConfig, SyncScheduler};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smokefree")]
#[command(about = "Track health milestones after quitting smoking", long_about = None)]
struct Cli {
    /// Remote backend base URL (overrides SMOKEFREE_REMOTE_URL)
    #[arg(long, global = true)]
    remote: Option<String>,

    /// Bearer token for the remote backend (overrides SMOKEFREE_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Directory for local state
    #[arg(long, global = true, default_value = ".smokefree")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a quit attempt
    Quit {
        /// Quit time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<Time>,
    },
    /// Record a relapse
    Relapse {
        /// Relapse time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<Time>,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },
    /// Refresh and show all milestones
    Status,
    /// Keep refreshing and show a live countdown
    Watch {
        /// Stop after this many countdown ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// List the milestone catalog
    Catalog,
    /// Delete local state
    Reset,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut config = SyncConfig::from_env();
    if let Some(url) = cli.remote {
        config = config.with_remote(url);
    }
    if let Some(token) = cli.token {
        config = config.with_auth_token(token);
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command {
        Commands::Quit { at } => {
            require_local(&config, "quit")?;
            let store = JsonStateStore::new(&cli.state_dir).await?;
            let source = open_local(&store, &clock).await?;
            let anchor = at.unwrap_or_else(|| clock.now());
            source.reset_quit_anchor(anchor).await;
            source.trigger_recompute().await?;
            store.save(&source.state().await).await?;
            println!("Quit recorded at {}", anchor);
        }
        Commands::Relapse { at, note } => {
            require_local(&config, "relapse")?;
            let store = JsonStateStore::new(&cli.state_dir).await?;
            let source = open_local(&store, &clock).await?;
            let mut event = RegressionEvent::at(at.unwrap_or_else(|| clock.now()));
            if let Some(note) = note {
                event = event.with_note(note);
            }
            let outcomes = source.record_relapse(&event).await?;
            source.trigger_recompute().await?;
            store.save(&source.state().await).await?;

            println!("Relapse recorded at {}", event.occurred_at);
            for outcome in outcomes.iter().filter(|o| o.regressed) {
                println!(
                    "  {} regressed, new target {} (+{}h)",
                    outcome.kind.name(),
                    outcome.new_target.format("%Y-%m-%d %H:%M"),
                    outcome.penalty().num_hours()
                );
            }
        }
        Commands::Status => match config.remote_url.clone() {
            Some(url) => {
                let session = remote_session(&url, &config, &clock)?;
                session.refresh().await;
                print_status(&session);
            }
            None => {
                let store = JsonStateStore::new(&cli.state_dir).await?;
                let source = Arc::new(open_local(&store, &clock).await?);
                let session = local_session(&source, &config, &clock).await;
                session.refresh().await;
                print_status(&session);
                store.save(&source.state().await).await?;
            }
        },
        Commands::Watch { ticks } => match config.remote_url.clone() {
            Some(url) => {
                let session = Arc::new(remote_session(&url, &config, &clock)?);
                watch(session, &config, ticks).await;
            }
            None => {
                let store = JsonStateStore::new(&cli.state_dir).await?;
                let source = Arc::new(open_local(&store, &clock).await?);
                let session = Arc::new(local_session(&source, &config, &clock).await);
                watch(session, &config, ticks).await;
                store.save(&source.state().await).await?;
            }
        },
        Commands::Catalog => {
            for kind in MilestoneKind::ALL {
                println!(
                    "  {:<22} {:>10}  {}",
                    kind.as_str(),
                    format_duration_hours(kind.target_duration_hours()),
                    kind.description()
                );
            }
        }
        Commands::Reset => {
            let store = JsonStateStore::new(&cli.state_dir).await?;
            store.clear().await?;
            println!("Local state cleared");
        }
    }

    Ok(())
}

fn require_local(config: &SyncConfig, command: &str) -> Result<()> {
    if config.remote_url.is_some() {
        bail!("`{command}` is only available for local state");
    }
    Ok(())
}

async fn open_local(store: &JsonStateStore, clock: &Arc<dyn Clock>) -> Result<LocalSource> {
    let state = store
        .load()
        .await?
        .unwrap_or_else(|| SourceState::new(SessionContext::default()));
    Ok(LocalSource::from_state(state, clock.clone()))
}

async fn local_session(
    source: &Arc<LocalSource>,
    config: &SyncConfig,
    clock: &Arc<dyn Clock>,
) -> HealthSession<LocalSource> {
    let context = source.state().await.session;
    if context.quit_anchor.is_none() {
        warn!("No quit time recorded; run `smokefree quit` first");
    }
    HealthSession::with_config(source.clone(), context, clock.clone(), config)
}

fn remote_session(
    url: &str,
    config: &SyncConfig,
    clock: &Arc<dyn Clock>,
) -> Result<HealthSession<HttpSource>> {
    let mut context = SessionContext::default();
    if let Some(token) = &config.auth_token {
        context = context.with_auth_token(token.clone());
    }
    let source = HttpSource::new(url, &context, config.request_timeout)?;
    Ok(HealthSession::with_config(Arc::new(source), context, clock.clone(), config))
}

async fn watch<S: MilestoneSource + 'static>(
    session: Arc<HealthSession<S>>,
    config: &SyncConfig,
    ticks: Option<u64>,
) {
    let mut scheduler = SyncScheduler::new(session.clone());
    scheduler.start(config.refresh_interval);

    let start = tokio::time::Instant::now() + config.tick_interval;
    let mut ticker = tokio::time::interval_at(start, config.tick_interval);
    let mut remaining = ticks;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                print_countdown(&session);
                if let Some(left) = remaining.as_mut() {
                    *left = left.saturating_sub(1);
                    if *left == 0 {
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    scheduler.stop().await;
}

fn print_status<S: MilestoneSource>(session: &HealthSession<S>) {
    let overview = session.overview();
    print_overview(&overview, session.origin());
    if let Some(error) = session.last_error() {
        println!("  Last error: {}", error);
    }

    println!();
    for milestone in session.milestones() {
        print_milestone(&milestone, session);
    }
}

fn print_overview(overview: &HealthOverview, origin: DataOrigin) {
    let source = match origin {
        DataOrigin::Empty => "no data",
        DataOrigin::Authoritative => "live",
        DataOrigin::Estimated => "offline estimate",
    };
    println!("Recovery status ({})", source);
    println!(
        "  Completed: {}/{}  In progress: {}  Overall: {:.1}%",
        overview.completed_metrics,
        overview.total_metrics,
        overview.in_progress_metrics,
        overview.overall_progress
    );
    if let Some(next) = &overview.next_milestone {
        println!("  Next: {}", next.kind.name());
    }
}

fn print_milestone<S: MilestoneSource>(milestone: &Milestone, session: &HealthSession<S>) {
    let remaining = session
        .countdown(milestone.kind)
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {:<34} {:>6.1}%  {:<12} {}",
        milestone.kind.name(),
        milestone.current_progress,
        milestone.state().label(),
        remaining
    );
}

fn print_countdown<S: MilestoneSource>(session: &HealthSession<S>) {
    if session.origin() == DataOrigin::Empty {
        println!("Waiting for data...");
        return;
    }
    let Some(next) = session.overview().next_milestone else {
        println!("No upcoming milestones");
        return;
    };
    match session.countdown(next.kind) {
        Some(countdown) if countdown.is_locally_complete() => {
            println!("{}: reached, waiting for confirmation", next.kind.name());
        }
        Some(countdown) => println!("{}: {}", next.kind.name(), countdown),
        None => println!("{}: unknown", next.kind.name()),
    }
}

fn format_duration_hours(hours: f64) -> String {
    const DAY: f64 = 24.0;
    const YEAR: f64 = 365.0 * DAY;
    if hours < 1.0 {
        format!("{:.0}m", hours * 60.0)
    } else if hours < 2.0 * DAY {
        format!("{:.0}h", hours)
    } else if hours < YEAR {
        format!("{:.0}d", hours / DAY)
    } else {
        format!("{:.0}y", hours / YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_hours() {
        assert_eq!(format_duration_hours(20.0 / 60.0), "20m");
        assert_eq!(format_duration_hours(24.0), "24h");
        assert_eq!(format_duration_hours(72.0), "3d");
        assert_eq!(format_duration_hours(24.0 * 365.0 * 10.0), "10y");
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from(["smokefree", "--remote", "http://localhost", "watch", "--ticks", "3"]);
        assert_eq!(cli.remote.as_deref(), Some("http://localhost"));
        assert!(matches!(cli.command, Commands::Watch { ticks: Some(3) }));

        let cli = Cli::parse_from(["smokefree", "quit", "--at", "2026-10-01T08:00:00Z"]);
        let Commands::Quit { at: Some(at) } = cli.command else {
            panic!("expected quit with time");
        };
        assert_eq!(at.to_rfc3339(), "2026-10-01T08:00:00+00:00");
        assert_eq!(cli.state_dir, PathBuf::from(".smokefree"));
    }
}
