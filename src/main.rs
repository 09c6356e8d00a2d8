// Binary-specific modules
mod help;

use c8run::clean::clean;
use c8run::commands::{Cli, Invocation, ParseError, RunOptions, Verb};
use c8run::config::C8RunConfig;
use c8run::error::{C8RunError, C8RunResult};
use c8run::health::HttpProbe;
use c8run::lifecycle::{LifecycleManager, StartOutcome};
use c8run::logging::init_logger;
use c8run::platform::{self, Platform};
use c8run::signal::wait_for_shutdown;
use clap::error::ErrorKind;
use help::print_help;
use std::process::ExitCode;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = init_logger(None) {
        eprintln!("Failed to initialize logging: {err}");
    }

    let args: Vec<String> = std::env::args().collect();

    // Bare help before clap, which would otherwise demand a verb
    if args.len() == 2 && matches!(args[1].as_str(), "-h" | "--help" | "help") {
        return show_help(ExitCode::SUCCESS);
    }

    let cli = match Cli::try_parse_command_from(&args) {
        Ok(cli) => cli,
        Err(err) if err.kind() == ErrorKind::DisplayVersion => {
            print!("{err}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            debug!("command line rejected: {}", err);
            return show_help(ExitCode::from(1));
        }
    };

    let invocation = match cli.invocation() {
        Ok(invocation) => invocation,
        Err(ParseError::HelpRequested) => return show_help(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", C8RunError::from(err));
            return show_help(ExitCode::from(1));
        }
    };

    println!("Command: {}", invocation.verb);
    match run(invocation).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("{} error: {}", err.category().display_name(), err);
            eprintln!("{}", err.user_message());
            ExitCode::from(1)
        }
    }
}

fn show_help(code: ExitCode) -> ExitCode {
    if let Err(err) = print_help() {
        eprintln!("Failed to print help: {err}");
    }
    code
}

async fn run(invocation: Invocation) -> C8RunResult<()> {
    let base_dir = std::env::current_dir()?;
    let config = C8RunConfig::from_env(base_dir);
    let platform = platform::current()?;
    let probe = HttpProbe::new();

    match invocation.verb {
        Verb::Start => start(&config, platform.as_ref(), &probe, &invocation.options).await,
        Verb::Stop => {
            LifecycleManager::new(&config, platform.as_ref(), &probe).stop()?;
            Ok(())
        }
        Verb::Clean => {
            let report = clean(&config, platform.as_ref())?;
            for path in &report.removed {
                println!("Removed {}", path.display());
            }
            Ok(())
        }
        Verb::Package => Err(C8RunError::UnsupportedCommand {
            command: Verb::Package.to_string(),
        }),
    }
}

async fn start(
    config: &C8RunConfig,
    platform: &dyn Platform,
    probe: &HttpProbe,
    options: &RunOptions,
) -> C8RunResult<()> {
    let manager = LifecycleManager::new(config, platform, probe);
    let interrupted = async {
        if let Err(err) = wait_for_shutdown().await {
            warn!("cannot listen for shutdown signals: {}", err);
            std::future::pending::<()>().await;
        }
    };
    let mut started = match manager
        .start_or_interrupt(options.config.as_deref(), interrupted)
        .await?
    {
        StartOutcome::Started(started) => started,
        StartOutcome::Interrupted => return Ok(()),
    };

    if options.detached {
        return Ok(());
    }

    println!("Press Ctrl+C to stop Camunda.");
    if let Err(err) = wait_for_shutdown().await {
        // Without a signal handler we cannot wait; leave services running
        warn!("cannot listen for shutdown signals: {}", err);
        return Ok(());
    }
    manager.stop_started(&mut started)
}
