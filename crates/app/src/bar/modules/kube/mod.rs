//! Current kubectl context, always visible, with its namespace as detail.

mod config;
pub use config::KubeConfig;

use std::time::Duration;

use anyhow::Result;
use bar::{
    BarBuilder, Button, ClickAction, ModeKey, ModeSpec, ModuleId, Segment, Side, poll, truncate,
};
use services::command;
use tracing::debug;

use crate::bar::icons;

pub const CONTEXT: ModuleId = ModuleId::new("kube_context");
pub const NAMESPACE: ModuleId = ModuleId::new("kube_namespace");

const CURRENT_CONTEXT: [&str; 2] = ["config", "current-context"];
const CURRENT_NAMESPACE: [&str; 4] = [
    "config",
    "view",
    "--minify",
    "-o=jsonpath={..namespace}",
];

pub fn format_context(context: &str, max_width: usize) -> Option<Segment> {
    if context.is_empty() {
        return None;
    }
    Some(
        Segment::new(icons::SHIP_WHEEL, truncate(context, max_width, Side::Start))
            .short_text(context.rsplit('/').next().unwrap_or(context))
            .on_click(Button::Left, ClickAction::Toggle(ModeKey::Kube)),
    )
}

/// kubectl prints nothing for a context without an explicit namespace.
pub fn format_namespace(namespace: &str) -> Segment {
    let namespace = if namespace.is_empty() {
        "default"
    } else {
        namespace
    };
    Segment::text(format!("Namespace: {}", namespace))
}

/// Register the context modules and the kube mode, unless disabled.
pub fn register(builder: &mut BarBuilder, config: &KubeConfig) -> Result<()> {
    if !config.enabled {
        debug!("Kubernetes context disabled");
        return Ok(());
    }

    let interval = Duration::from_secs(config.interval_secs.max(1));
    let timeout = Duration::from_secs(config.timeout_secs);
    let max_width = config.max_width;

    builder.module(
        CONTEXT,
        poll(interval, move || async move {
            let context = command::run("kubectl", &CURRENT_CONTEXT, timeout).await?;
            anyhow::Ok(format_context(&context, max_width))
        }),
    )?;
    builder.module(
        NAMESPACE,
        poll(interval, move || async move {
            let namespace = command::run("kubectl", &CURRENT_NAMESPACE, timeout).await?;
            anyhow::Ok(format_namespace(&namespace))
        }),
    )?;

    builder.mode(
        ModeSpec::new(ModeKey::Kube)
            .override_segment(Segment::icon(icons::SHIP_WHEEL))
            .always([CONTEXT])
            .detail([NAMESPACE]),
    )?;
    Ok(())
}
