//! Battery charge from UPower: time left as the mode summary, charge,
//! energy and power as detail. The charge icon doubles as the mode's
//! override segment.

use anyhow::Result;
use bar::{BarBuilder, Color, ModeKey, ModeSpec, ModuleId, Output, Segment, push};
use futures_signals::signal::SignalExt;
use services::{BatteryData, BatteryState, UPowerData, UPowerSubscriber};

use super::{hours_minutes, split_into};

pub const SUMMARY: ModuleId = ModuleId::new("battery");
pub const DETAIL: ModuleId = ModuleId::new("battery_detail");

const DISCHARGING: [&str; 11] = [
    "󰂎", "󰁺", "󰁻", "󰁼", "󰁽", "󰁾", "󰁿", "󰂀", "󰂁", "󰂂", "󰁹",
];
const CHARGING: [&str; 11] = [
    "󰢟", "󰢜", "󰂆", "󰂇", "󰂈", "󰢝", "󰂉", "󰢞", "󰂊", "󰂋", "󰂅",
];

/// Charge icon, one step per ten percent.
pub fn battery_icon(battery: &BatteryData) -> &'static str {
    let tenth = usize::from(battery.remaining_pct() / 10);
    if battery.is_charging() {
        CHARGING[tenth]
    } else {
        DISCHARGING[tenth]
    }
}

fn present(data: &UPowerData) -> Option<&BatteryData> {
    data.battery
        .as_ref()
        .filter(|battery| battery.state != BatteryState::Unknown)
}

/// Summary segment followed by the detail segments, colored by charge.
pub fn format(data: &UPowerData) -> Option<Output> {
    let battery = present(data)?;
    let icon = battery_icon(battery);
    let pct = battery.remaining_pct();
    let remaining = hours_minutes(battery.remaining_time());

    let output = Output::empty()
        .push(Segment::new(icon, remaining.clone()))
        .push(Segment::new(icon, format!("{}% ({})", pct, remaining)))
        .push(Segment::text(format!(
            "{:4.1}/{:4.1}Wh",
            battery.energy, battery.energy_full
        )))
        .push(Segment::text(format!("{:+6.2}W", battery.signed_power())));

    Some(match pct {
        0..=5 => output.urgent(true),
        6..=25 => output.with_color(Color::Bad),
        26..=50 => output.with_color(Color::Degraded),
        _ => output.with_color(Color::Good),
    })
}

/// Register the battery modules and mode. Without UPower the modules stay
/// empty and the mode shows nothing.
pub fn register(builder: &mut BarBuilder, upower: Option<&UPowerSubscriber>) -> Result<()> {
    let detail = builder.static_module(DETAIL)?;

    match upower {
        Some(upower) => {
            let controller = builder.controller();
            builder.module(
                SUMMARY,
                push(upower.subscribe().to_stream(), move |data: UPowerData| {
                    let icon = present(&data).map(|b| Segment::icon(battery_icon(b)));
                    let _ = controller.set_override(ModeKey::Battery, icon);
                    split_into(&detail, 1, format(&data))
                }),
            )?;
        }
        None => {
            builder.static_module(SUMMARY)?;
        }
    }

    builder.mode(
        ModeSpec::new(ModeKey::Battery)
            .summary([SUMMARY])
            .detail([DETAIL]),
    )?;
    Ok(())
}
