//! Log transport changes and playback position for one player.
//!
//! Discovery and SUBSCRIBE are not part of this crate, so the player and the
//! subscription ID are given on the command line:
//!
//! ```text
//! cargo run -p sonos-monitor --example monitor_events -- <player-ip> <room-name> <sid>
//! ```
//!
//! Subscribe the player's `/MediaRenderer/AVTransport/Event` URL with the
//! callback address this prints, then pass the `SID` it answered with.
//! `SONOS_MONITOR_LOG_MODE=debug` (or `SONOS_MONITOR_LOG=debug`) shows every
//! notification.

use std::net::IpAddr;

use sonos_monitor::logging::{init_logging_from_env, is_initialized};
use sonos_monitor::{Device, EventMonitor, EventTypeTag, MonitorConfig, ServiceIdentity};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;
    if !is_initialized() {
        eprintln!("Logging is silent, only the final counters will be printed");
    }

    let mut args = std::env::args().skip(1);
    let (Some(ip), Some(room), Some(sid)) = (args.next(), args.next(), args.next()) else {
        eprintln!("usage: monitor_events <player-ip> <room-name> <sid>");
        std::process::exit(2);
    };
    let ip: IpAddr = ip.parse()?;

    let monitor = EventMonitor::builder(MonitorConfig::default()).start().await?;
    println!("Callback URL: <{}>", monitor.callback_url());

    let service = ServiceIdentity::new(format!("{}/AVTransport", ip));
    monitor
        .registry()
        .register(Device::new(format!("player@{}", ip).as_str(), room, service.clone(), ip));
    monitor
        .register_subscription(sid, service, EventTypeTag::AVTransport)
        .await;

    println!("Listening for events, Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    let stats = monitor.shutdown().await?;
    println!(
        "{} notifications, {} state changes handled, {} decode errors, {} handler errors",
        stats.notifications_received,
        stats.state_changes_handled,
        stats.decode_errors,
        stats.handler_errors
    );
    Ok(())
}
