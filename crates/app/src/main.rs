//! modalbar - a modal status line for i3bar and swaybar.

use std::time::Duration;

use services::{Intervals, Services};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

mod args;
mod bar;
mod config;
mod protocol;

use args::Args;
use config::{Config, Theme};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref());
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    let theme = Theme::try_from(&config.theme)?;

    let services = Services::new(Intervals {
        sysinfo: Duration::from_secs(config.sysinfo.interval_secs.max(1)),
        network: Duration::from_secs(config.network.interval_secs.max(1)),
        audio: Duration::from_secs(config.media.volume_interval_secs.max(1)),
    })
    .await;

    let bar = bar::build(&config, &services)?;
    let clicks = protocol::clicks(BufReader::new(tokio::io::stdin()));
    tokio::spawn(bar.dispatcher().run(clicks));

    bar.run(protocol::spawn_writer(tokio::io::stdout(), theme))
        .await
}
