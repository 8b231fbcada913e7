//! The bar line: modes first, then the local date and time.
//!
//! Mode order is registration order: kube, network, media, sysinfo,
//! battery, weather, timezones.

pub mod icons;
pub mod modules;

use anyhow::{Context, Result};
use bar::Bar;
use services::Services;

use crate::config::Config;
use modules::{battery, clock, kube, media, network, sysinfo, weather};

/// Register every module and mode and validate the result.
pub fn build(config: &Config, services: &Services) -> Result<Bar> {
    let mut builder = Bar::builder();

    kube::register(&mut builder, &config.kube)?;
    network::register(&mut builder, &services.network)?;
    media::register(
        &mut builder,
        &config.media,
        services.mpris.as_ref(),
        &services.audio,
    )?;
    sysinfo::register(&mut builder, &config.sysinfo, &services.sysinfo)?;
    battery::register(&mut builder, services.upower.as_ref())?;
    weather::register(&mut builder, &config.weather)?;
    clock::register(&mut builder, &config.clock, &config.timezones)?;

    builder
        .place_modes()
        .place(clock::DATE)
        .place(clock::TIME);

    builder.build().context("Invalid bar setup")
}
