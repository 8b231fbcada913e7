//! Bar modules and the formatting helpers they share.

pub mod battery;
pub mod clock;
pub mod kube;
pub mod media;
pub mod network;
pub mod sysinfo;
pub mod weather;

use std::time::Duration;

use bar::{Color, IntoOutput, ModuleSlot, Output, Segment};

pub use clock::{ClockConfig, TimezoneConfig};
pub use kube::KubeConfig;
pub use media::MediaConfig;
pub use network::NetworkConfig;
pub use sysinfo::SysInfoConfig;
pub use weather::WeatherConfig;

/// Color a segment by severity: `urgent` wins, then the first set flag of
/// bad, degraded and good.
pub(crate) fn threshold(
    segment: Segment,
    urgent: bool,
    bad: bool,
    degraded: bool,
    good: bool,
) -> Segment {
    if urgent {
        return segment.urgent(true);
    }
    segment.color(Color::threshold(bad, degraded, good))
}

/// Route the first `n` segments of a formatted value to the producer's own
/// slot and the rest to `rest`.
///
/// Lets one data source feed both a mode summary and its detail.
pub(crate) fn split_into(rest: &ModuleSlot, n: usize, value: impl IntoOutput) -> Output {
    let (head, tail) = value.into_output(rest.id()).split_at(n);
    rest.set(tail);
    head
}

/// `h:mm`, hours unbounded.
pub(crate) fn hours_minutes(d: Duration) -> String {
    let minutes = d.as_secs() / 60;
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// `m:ss`, or `h:mm:ss` from an hour on.
pub(crate) fn media_time(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

fn scaled(mut value: f64, base: f64, units: &[&str]) -> String {
    let mut unit = 0;
    while value >= base && unit + 1 < units.len() {
        value /= base;
        unit += 1;
    }
    if unit == 0 {
        return format!("{} {}", value as u64, units[0]);
    }
    // Three significant digits.
    if value >= 100.0 {
        format!("{:.0} {}", value, units[unit])
    } else if value >= 10.0 {
        format!("{:.1} {}", value, units[unit])
    } else {
        format!("{:.2} {}", value, units[unit])
    }
}

/// Binary byte size: `512 B`, `1.50 GiB`.
pub(crate) fn ibytes(bytes: u64) -> String {
    scaled(
        bytes as f64,
        1024.0,
        &["B", "KiB", "MiB", "GiB", "TiB", "PiB"],
    )
}

/// Decimal byte rate: `0 B/s`, `12.5 kB/s`.
pub(crate) fn byterate(bytes_per_sec: u64) -> String {
    scaled(
        bytes_per_sec as f64,
        1000.0,
        &["B/s", "kB/s", "MB/s", "GB/s", "TB/s"],
    )
}

/// Binary byte rate: `0 B/s`, `1.50 MiB/s`.
pub(crate) fn ibyterate(bytes_per_sec: u64) -> String {
    scaled(
        bytes_per_sec as f64,
        1024.0,
        &["B/s", "KiB/s", "MiB/s", "GiB/s", "TiB/s"],
    )
}

pub(crate) const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[cfg(test)]
mod tests {
    use super::*;
    use bar::ModuleId;

    #[test]
    fn test_threshold_order() {
        let seg = || Segment::text("x");
        assert!(threshold(seg(), true, true, false, false).is_urgent());
        assert_eq!(
            threshold(seg(), false, true, true, true).color_value(),
            Some(Color::Bad)
        );
        assert_eq!(
            threshold(seg(), false, false, true, true).color_value(),
            Some(Color::Degraded)
        );
        assert_eq!(threshold(seg(), false, false, false, false).color_value(), None);
    }

    #[test]
    fn test_time_formats() {
        assert_eq!(hours_minutes(Duration::from_secs(3 * 3600 + 7 * 60)), "3:07");
        assert_eq!(hours_minutes(Duration::from_secs(59)), "0:00");
        assert_eq!(media_time(Duration::from_secs(83)), "1:23");
        assert_eq!(media_time(Duration::from_secs(3723)), "1:02:03");
    }

    #[test]
    fn test_byte_formats() {
        assert_eq!(ibytes(512), "512 B");
        assert_eq!(ibytes(1536 * 1024 * 1024), "1.50 GiB");
        assert_eq!(ibytes(20 * 1024 * 1024), "20.0 MiB");
        assert_eq!(byterate(0), "0 B/s");
        assert_eq!(byterate(12_500), "12.5 kB/s");
        assert_eq!(byterate(250_000_000), "250 MB/s");
        assert_eq!(ibyterate(0), "0 B/s");
        assert_eq!(ibyterate(3 * 512 * 1024), "1.50 MiB/s");
    }

    #[test]
    fn test_split_into() {
        let rest = ModuleSlot::new(ModuleId::new("detail"));
        let head = split_into(
            &rest,
            1,
            Output::empty()
                .push(Segment::text("a"))
                .push(Segment::text("b"))
                .push(Segment::text("c")),
        );
        assert_eq!(head.len(), 1);
        assert_eq!(rest.get().len(), 2);

        let head = split_into(&rest, 1, None::<Segment>);
        assert!(head.is_empty());
        assert!(rest.get().is_empty());
    }
}
