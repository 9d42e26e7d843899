//! Binary entrypoint for the relaybot CLI.
//!
//! Commands:
//! - `start` - run the relay against the line-oriented console host (stdin/stdout)
//! - `init` - create a starter `config.toml`
//! - `status` - print pending queue sizes per recipient
//!
//! See the library crate docs for module‑level details: `relaybot::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use relaybot::config::Config;
use relaybot::console;
use relaybot::relay::{OnlineUsers, PendingStore, RelayBot};

#[derive(Parser)]
#[command(name = "relaybot")]
#[command(about = "Offline message relay for chat bots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay with a console host on stdin/stdout
    Start,
    /// Write a default configuration file
    Init,
    /// Show pending messages per recipient
    Status,
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
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let version = env!("CARGO_PKG_VERSION");
            info!("Starting relaybot v{} as {}", version, config.bot.nick);
            let mut bot = RelayBot::open(&config).await;
            if !bot.store().is_persistent() {
                info!("running without persistence; queue is lost on exit");
            }
            let mut online = OnlineUsers::new();
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console::run(&mut bot, &mut online, stdin, tokio::io::stdout()).await?;
            let pending = bot.store().len();
            info!("console closed; {} recipients still pending", pending);
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let storage = &config.storage;
            let coalesce = storage.save_coalesce();
            let store = PendingStore::open_or_degrade(&storage.data_dir, coalesce).await;
            println!(
                "{} pending messages for {} recipients ({} known users)",
                store.total_messages(),
                store.len(),
                store.known().len()
            );
            for (key, queue) in store.iter() {
                println!("  {:<32} {}", key.to_string(), queue.len());
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides config
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_path = config.as_ref().and_then(|cfg| cfg.logging.file.as_ref());
    let log_file = log_path.and_then(|file| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .ok()
    });
    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Console echo only in the foreground; the console host owns stdout otherwise
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
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
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
