//! Binary entrypoint for the chatpager CLI.
//!
//! Commands:
//! - `init` - write a starter `chatpager.toml`
//! - `demo [--json]` - drive a sample paginated response from stdin
//!
//! See the library crate docs for module-level details: `chatpager::`.
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use chatpager::cache::dispatch::{dispatch, send_response, Outcome};
use chatpager::cache::sweeper::{start_sweeper, SweeperConfig};
use chatpager::cache::ResponseCache;
use chatpager::config::Config;
use chatpager::demo::{self, ConsoleSink, DemoCommand};
use chatpager::metrics;
use chatpager::snowflake::Snowflake;

#[derive(Parser)]
#[command(name = "chatpager")]
#[command(about = "Paginated, navigable chat responses with a self-expiring cache")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "chatpager.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Drive the sample response interactively from stdin
    Demo {
        /// Print outbound payloads as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Demo { json } => {
            let config = Config::load(&cli.config).await.ok();
            init_logging(&config, cli.verbose);
            let config = config.unwrap_or_else(|| {
                warn!("No usable config at {}; using defaults", cli.config);
                Config::default()
            });
            run_demo(config, json).await?;
        }
    }

    Ok(())
}

async fn run_demo(config: Config, json: bool) -> Result<()> {
    let channel = Snowflake(config.bot.demo_channel);
    let user = Snowflake(config.bot.demo_user);
    let cache = Arc::new(ResponseCache::new());
    let sweeper = start_sweeper(cache.clone(), SweeperConfig::from_config(&config.cache));
    let sink = ConsoleSink::new(json);

    let response = demo::sample_response(&config.responses)?;
    let message = send_response(&cache, &sink, channel, user, response).await?;
    info!(
        "{} demo running; message {} lives {}s after each interaction",
        config.bot.name,
        message,
        config.responses.time_to_live()
    );
    if !json {
        println!("{}", demo::HELP);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match demo::parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        match command {
            DemoCommand::Quit => break,
            DemoCommand::Help => {
                println!("{}", demo::HELP);
                continue;
            }
            _ => {}
        }
        let Some(interaction) = command.interaction(channel, message, user) else {
            continue;
        };
        let outcome = match dispatch(&cache, &sink, interaction).await {
            Ok(outcome) => outcome,
            Err(e) => {
                println!("interaction failed: {}", e);
                continue;
            }
        };
        match (outcome, command.modal_inputs(), sink.last_modal()) {
            (Outcome::ModalPresented, Some(inputs), Some(modal)) => {
                let submit = demo::modal_submit(channel, message, user, &modal, inputs);
                match dispatch(&cache, &sink, submit).await {
                    Ok(Outcome::Unchanged) => println!("(nothing changed)"),
                    Ok(_) => {}
                    Err(e) => println!("search failed: {}", e),
                }
            }
            (Outcome::Unchanged, _, _) => println!("(nothing changed)"),
            (Outcome::Unhandled(id), _, _) => println!("(no handler for {})", id),
            _ => {}
        }
    }

    if let Some(stats) = sweeper.snapshot().await {
        info!(
            "sweeper ran {} times, evicted {} entries",
            stats.sweeps, stats.evicted_total
        );
    }
    sweeper.shutdown().await;
    let m = metrics::snapshot();
    info!(
        "session totals: created={} handled={} busy_rejections={} expired={} rebuilds={} send_failures={}",
        m.entries_created,
        m.interactions_handled,
        m.interactions_rejected_busy,
        m.interactions_expired,
        m.component_rebuilds,
        m.send_failures
    );
    let mut actions: Vec<_> = metrics::action_counters_snapshot().into_iter().collect();
    actions.sort();
    for (kind, count) in actions {
        info!("  action {}: {}", kind, count);
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });
    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Only echo to the console when someone is watching it
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}: {}", ts, record.level(), record.target(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
