//! pomo - Work/break interval timer
//!
//! Usage:
//!   pomo                        Run the timer with configured durations
//!   pomo run --work 50 --break 10 --start
//!   pomo run --json             One JSON snapshot per line
//!   pomo config                 Show effective settings
//!   pomo config --init          Write a default config file

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pomo::config::Settings;
use pomo::driver::{Driver, DriverOptions};
use pomo::notify::Backend;
use pomo::TimerEngine;

/// pomo - Work/break interval timer
#[derive(Parser)]
#[command(name = "pomo")]
#[command(about = "Work/break interval timer with a drift-free countdown")]
#[command(version)]
#[command(after_help = r#"CONTROLS (while running):
    s / <enter>   start or pause
    r             reset the current phase
    n             skip to the other phase
    a             advance after a phase finishes
    c WORK BREAK  change durations (minutes)
    q             quit

LIMITS:
    work  1-60 minutes (default 25)
    break 1-30 minutes (default 5)

EXAMPLES:
    pomo                        # 25/5 timer, press enter to start
    pomo run --start            # start counting right away
    pomo run -w 50 -b 10        # custom durations
    pomo run --json             # machine readable output
    RUST_LOG=pomo=debug pomo    # trace every transition on stderr
"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive timer
    #[command(alias = "r")]
    Run(RunArgs),

    /// Show or create the config file
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Work duration in minutes (1-60)
    #[arg(short, long, value_name = "MINS")]
    work: Option<u32>,

    /// Break duration in minutes (1-30)
    #[arg(short, long = "break", value_name = "MINS")]
    brk: Option<u32>,

    /// Poll interval in milliseconds (100-1000)
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,

    /// Start counting immediately
    #[arg(long)]
    start: bool,

    /// Start the next phase automatically when one completes
    #[arg(long)]
    auto_continue: bool,

    /// Don't send desktop notifications
    #[arg(long)]
    no_notify: bool,

    /// Print one JSON snapshot per line
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => cmd_run(args),
        Some(Commands::Config { init }) => cmd_config(init),
        None => cmd_run(RunArgs::default()),
    }
}

/// Merge command line flags over the settings file
fn effective_settings(args: &RunArgs) -> Result<Settings> {
    let mut settings = Settings::load()?;

    if let Some(work) = args.work {
        settings.work_minutes = work;
    }
    if let Some(brk) = args.brk {
        settings.break_minutes = brk;
    }
    if let Some(tick_ms) = args.tick_ms {
        settings.tick_ms = tick_ms;
    }
    if args.auto_continue {
        settings.auto_continue = true;
    }
    if args.no_notify {
        settings.notify = false;
    }

    Ok(settings)
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let settings = effective_settings(&args)?;
    let durations = settings.durations();
    debug!(?settings, "effective settings");

    let mut engine = TimerEngine::new(durations);
    if args.start {
        engine.start(chrono::Utc::now())?;
    }

    let options = DriverOptions {
        tick: settings.tick(),
        auto_continue: settings.auto_continue,
        json: args.json,
        in_place: !args.json && std::io::stdout().is_terminal(),
    };

    let mut driver = Driver::new(engine, options);
    if settings.notify {
        let backend = Backend::detect();
        debug!(backend = backend.name(), "notifications enabled");
        driver = driver.with_notifier(Arc::new(backend));
    }

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        let input = BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();
        driver.run(input, &mut output).await
    });
    // stdin reads happen on a blocking thread that may still be parked
    rt.shutdown_background();
    let engine = result?;

    info!(
        sessions_completed = engine.sessions_completed(),
        "timer stopped"
    );
    if !args.json {
        println!("Sessions completed: {}", engine.sessions_completed());
    }

    Ok(())
}

fn cmd_config(init: bool) -> Result<()> {
    let path = Settings::config_path();

    if init {
        if path.exists() {
            bail!("Config already exists: {}", path.display());
        }
        Settings::default().save_to(&path)?;
        println!("[ok] Wrote {}", path.display());
        return Ok(());
    }

    let settings = Settings::load()?;
    let durations = settings.durations();
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };

    println!("Config: {}", source);
    println!();
    println!("  work_minutes   {}", durations.work_minutes());
    println!("  break_minutes  {}", durations.break_minutes());
    println!("  tick_ms        {}", settings.tick().as_millis());
    println!("  notify         {}", settings.notify);
    println!("  auto_continue  {}", settings.auto_continue);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from(["pomo", "run", "-w", "50", "--break", "10", "--json"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.work, Some(50));
        assert_eq!(args.brk, Some(10));
        assert!(args.json);
        assert!(!args.start);
    }

    #[test]
    fn test_no_subcommand_runs() {
        let cli = Cli::try_parse_from(["pomo"]).unwrap();
        assert!(cli.command.is_none());
    }
}
