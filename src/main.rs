use clap::Parser;

use wgbridge::cli::{Cli, TopCommand};

#[cfg(unix)]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use wgbridge::keys;
    use wgbridge::wg_tool::WgToolAdapter;
    use wgbridge::{ConnectionStatus, TunnelController};

    let cli = Cli::parse();
    wgbridge::logging::init(cli.verbose);

    let controller = TunnelController::new(Arc::new(WgToolAdapter::new()));

    match cli.command {
        TopCommand::Genkey => {
            let pair = keys::generate_key_pair();
            println!("{}", serde_json::to_string_pretty(&pair)?);
        }
        TopCommand::Status { tunnel } => {
            controller.setup_tunnel(&tunnel).await?;
            println!("{}", controller.current_status());
        }
        TopCommand::Connect { tunnel, config } => {
            let config_text = tokio::fs::read_to_string(&config).await?;
            controller.setup_tunnel(&tunnel).await?;
            let mut rx = controller.subscribe();
            controller.connect(&config_text).await?;
            // The monitor flips Connecting to Connected once the interface
            // is observed up.
            loop {
                match *rx.borrow_and_update() {
                    ConnectionStatus::Connected => {
                        println!("{tunnel}: connected");
                        break;
                    }
                    ConnectionStatus::Disconnected => {
                        anyhow::bail!("{tunnel}: connection lost before it was established");
                    }
                    _ => {}
                }
                rx.changed().await?;
            }
        }
        TopCommand::Disconnect { tunnel } => {
            controller.setup_tunnel(&tunnel).await?;
            controller.disconnect().await?;
            println!("{tunnel}: disconnected");
        }
        TopCommand::Watch { tunnel } => {
            controller.setup_tunnel(&tunnel).await?;
            let mut rx = controller.subscribe();
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                let status = *rx.borrow_and_update();
                match controller.statistics_snapshot() {
                    Some(stats) => println!(
                        "{tunnel}: {status} rx={} tx={} last_handshake_ms={}",
                        stats.total_download, stats.total_upload,
                        stats.latest_handshake_epoch_millis
                    ),
                    None => println!("{tunnel}: {status}"),
                }
                tokio::select! {
                    changed = rx.changed() => changed?,
                    _ = ticker.tick() => {}
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    let _ = Cli::parse();
    eprintln!("wgbridge requires a unix host with the wg tools installed");
    std::process::exit(1);
}
