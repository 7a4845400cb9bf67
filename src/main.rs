use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use evolve_audit::cli::{Cli, Command};
use evolve_audit::config::ProjectLayout;
use evolve_audit::metrics::LifecyclePolicy;
use evolve_audit::output;
use evolve_audit::platform::PlatformSyncOptions;
use evolve_audit::store::{canonical_platform, RuleFilter};
use evolve_audit::workflow::{self, CommandOutcome, SyncOptions};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match run(cli, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("EVOLVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn emit<T>(
    out: &mut dyn Write,
    outcome: CommandOutcome<T>,
    render: impl FnOnce(&mut dyn Write, &T) -> Result<()>,
) -> Result<()> {
    match outcome {
        CommandOutcome::Completed(value) => render(out, &value),
        CommandOutcome::Skipped(reason) => output::render_skipped(out, &reason),
    }
}

fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let layout = ProjectLayout::resolve(&cli.project_root).context("Failed to resolve project root")?;
    let today: NaiveDate = Local::now().date_naive();

    match cli.command {
        Command::Score { card, scope, platform } => {
            let keywords = RuleFilter::parse_keywords(scope.as_slice());
            let filter = RuleFilter::new(keywords, platform.as_deref());
            emit(out, workflow::score(&layout, &card, filter, today)?, output::render_score)
        }
        Command::Sync {
            evolve_platform,
            platform,
            no_platform_sync,
            review_precedence,
        } => {
            let options = SyncOptions {
                evolve_platform: evolve_platform.map(|p| canonical_platform(&p)),
                platform: PlatformSyncOptions {
                    only: platform.map(|p| canonical_platform(&p)),
                    skip: no_platform_sync,
                },
                policy: LifecyclePolicy {
                    precedence: review_precedence.into(),
                    ..Default::default()
                },
            };
            emit(out, workflow::sync(&layout, &options, today)?, output::render_sync)
        }
        Command::SyncPlatform { platform } => {
            let options = PlatformSyncOptions {
                only: platform.map(|p| canonical_platform(&p)),
                skip: false,
            };
            emit(
                out,
                workflow::sync_platform(&layout, &options, today)?,
                output::render_platform_sync,
            )
        }
        Command::Report => emit(out, workflow::report(&layout)?, output::render_report),
        Command::Select { clear: true, .. } => {
            emit(out, workflow::clear(&layout)?, |out, changed| output::render_clear(out, *changed))
        }
        Command::Select { numbers, .. } => {
            let raw = numbers.unwrap_or_default();
            emit(out, workflow::select(&layout, &raw)?, output::render_select)
        }
        Command::Scopes { platform } => {
            emit(out, workflow::scopes(&layout, platform.as_deref())?, output::render_scopes)
        }
        Command::Filter { keywords, platform } => {
            let filter = RuleFilter::new(RuleFilter::parse_keywords(&keywords), platform.as_deref());
            emit(out, workflow::filter(&layout, &filter)?, output::render_filter)
        }
        Command::Promote { platform } => {
            let platform = platform.map(|p| canonical_platform(&p));
            emit(
                out,
                workflow::promote(&layout, platform.as_deref())?,
                |out, candidates| output::render_promote(out, candidates, platform.as_deref()),
            )
        }
        Command::Health { json, output: path } => {
            let report = workflow::health(&layout, today);
            if let Some(path) = path {
                output::write_health_report(&report, &path)?;
            }
            if json {
                output::render_health_json(out, &report)
            } else {
                output::render_health(out, &report)
            }
        }
    }
}
