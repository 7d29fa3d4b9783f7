//! Diagnostic CLI: validate a relay configuration file and summarize what
//! it contains, optionally watching it for reloads.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use relay_config::config::watcher;
use relay_config::observability::logging;
use relay_config::{Config, LogSink, RelayConfig, Shutdown};

#[derive(Parser)]
#[command(name = "config-check")]
#[command(about = "Validate and inspect a relay configuration file", long_about = None)]
struct Cli {
    /// Path to the configuration file (.toml, .json, .yaml)
    config: PathBuf,

    /// Dump the projected settings as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Keep running and log reloads as the file changes (Ctrl-C to stop)
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let sink = LogSink::new();
    logging::init(&sink);

    let config = match RelayConfig::from_file(&cli.config, Some(&sink)) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            eprintln!("config-check: {}: {}", cli.config.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let values = config.values();
    if cli.json {
        match serde_json::to_string_pretty(values.as_ref()) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("config-check: failed to render settings: {}", err);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}: OK", cli.config.display());
        for (family, name, settings) in values.instances() {
            let label = if settings.server.is_empty() {
                String::new()
            } else {
                format!(" ({})", settings.server)
            };
            println!("  instance {}.{}{}", family, name, label);
        }
        for gateway in &values.gateway {
            println!(
                "  gateway {} enable={} in={} out={} inout={}",
                gateway.name,
                gateway.enable,
                gateway.inbound.len(),
                gateway.outbound.len(),
                gateway.bidirectional.len(),
            );
        }
        for group in &values.same_channel_gateway {
            println!(
                "  samechannelgateway {} channels={} accounts={}",
                group.name,
                group.channels.len(),
                group.accounts.len(),
            );
        }
        let patterns = values.general.media_download_blacklist.len();
        if patterns > 0 {
            println!("  media blacklist: {} pattern(s) configured", patterns);
        }
    }

    if cli.watch {
        let shutdown = Shutdown::new();
        let watcher_rx = shutdown.subscribe();
        let watcher_task =
            tokio::spawn(watcher::watch_until_shutdown(Arc::clone(&config), watcher_rx));

        shutdown.trigger_on_ctrl_c().await;

        match watcher_task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                eprintln!("config-check: watcher failed: {}", err);
                return ExitCode::FAILURE;
            }
            Err(err) => {
                eprintln!("config-check: watcher task panicked: {}", err);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
