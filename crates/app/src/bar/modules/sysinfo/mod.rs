//! Load, uptime, memory, temperature, disk IO and disk space.
//!
//! Disk space is always visible; everything else is detail of the sysinfo
//! mode.

mod config;
pub use config::SysInfoConfig;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use bar::{BarBuilder, IntoOutput, ModeKey, ModeSpec, ModuleId, Producer, Segment, push};
use futures_signals::signal::SignalExt;
use services::{DiskInfo, SysInfoData, SysInfoSubscriber};

use super::{GIB, hours_minutes, ibyterate, ibytes, threshold};
use crate::bar::icons;

pub const LOAD: ModuleId = ModuleId::new("load");
pub const LOAD_DETAIL: ModuleId = ModuleId::new("load_detail");
pub const UPTIME: ModuleId = ModuleId::new("uptime");
pub const MEMORY: ModuleId = ModuleId::new("memory");
pub const SWAP: ModuleId = ModuleId::new("swap");
pub const TEMPERATURE: ModuleId = ModuleId::new("temperature");
pub const DISK_IO: ModuleId = ModuleId::new("disk_io");
pub const DISK_ROOT: ModuleId = ModuleId::new("disk_root");
pub const DISK_HOME: ModuleId = ModuleId::new("disk_home");

/// Load averages run high for a while after boot.
const LOAD_SETTLE: Duration = Duration::from_secs(10 * 60);

// A zero uptime means the first sample has not arrived yet.
fn sampled(data: &SysInfoData) -> Option<&SysInfoData> {
    (!data.uptime.is_zero()).then_some(data)
}

pub fn format_load(data: &SysInfoData) -> Option<Segment> {
    let data = sampled(data)?;
    let [load1, _, load15] = data.loads;
    let segment = Segment::new(icons::DESKTOP, format!("{:.2}", load1));
    if data.uptime < LOAD_SETTLE {
        return Some(segment);
    }
    Some(threshold(
        segment,
        load1 > 128.0 || load15 > 64.0,
        load1 > 64.0 || load15 > 32.0,
        load1 > 32.0 || load15 > 16.0,
        false,
    ))
}

pub fn format_load_detail(data: &SysInfoData) -> Option<Segment> {
    let data = sampled(data)?;
    Some(Segment::text(format!("{:.2} {:.2}", data.loads[1], data.loads[2])))
}

/// `h:mm` for the first day, `NdHHh` after.
pub fn format_uptime(data: &SysInfoData) -> Option<Segment> {
    let data = sampled(data)?;
    let hours = data.uptime.as_secs() / 3600;
    let text = if hours < 24 {
        hours_minutes(data.uptime)
    } else {
        format!("{}d{:02}h", hours / 24, hours % 24)
    };
    Some(Segment::new(icons::UPTIME, text))
}

pub fn format_memory(data: &SysInfoData) -> Option<Segment> {
    let memory = sampled(data)?.memory;
    let free = memory.available as f64 / GIB;
    Some(threshold(
        Segment::new(icons::MEMORY, ibytes(memory.available)),
        free < 0.5,
        free < 1.0,
        free < 2.0,
        free > 12.0,
    ))
}

pub fn format_swap(data: &SysInfoData) -> Option<Segment> {
    let memory = sampled(data)?.memory;
    if memory.swap_total == 0 {
        return None;
    }
    Some(Segment::new(
        icons::SWAP,
        format!(
            "{} ({:2.0}%)",
            ibytes(memory.swap_used),
            memory.swap_frac() * 100.0
        ),
    ))
}

pub fn format_temperature(data: &SysInfoData) -> Option<Segment> {
    let celsius = data.temperature?;
    Some(threshold(
        Segment::new(icons::FAN, format!("{:2}℃", celsius as i32)),
        celsius > 90.0,
        celsius > 70.0,
        celsius > 60.0,
        false,
    ))
}

/// Combined read and write rate of the root device.
pub fn format_disk_io(data: &SysInfoData) -> Option<Segment> {
    let root = sampled(data)?.disk_for(Path::new("/"))?;
    Some(Segment::new(
        icons::SWAP_VERTICAL,
        ibyterate(root.read_rate + root.write_rate),
    ))
}

pub fn format_disk(disk: &DiskInfo, icon: &str) -> Segment {
    let frac = disk.avail_frac();
    threshold(
        Segment::new(icon, ibytes(disk.available)),
        (disk.available as f64) < GIB,
        frac < 0.05,
        frac < 0.1,
        false,
    )
}

/// The home filesystem, unless it lives on the root device.
pub fn home_disk<'a>(data: &'a SysInfoData, home: &Path) -> Option<&'a DiskInfo> {
    let root = data.disk_for(Path::new("/"))?;
    let home = data.disk_for(home)?;
    (home.name != root.name).then_some(home)
}

fn watch<F, R>(sysinfo: &SysInfoSubscriber, format: F) -> impl Producer
where
    F: Fn(&SysInfoData) -> R + Send + 'static,
    R: IntoOutput,
{
    push(sysinfo.subscribe().to_stream(), move |data: SysInfoData| {
        format(&data)
    })
}

/// Register the system information modules and mode.
pub fn register(
    builder: &mut BarBuilder,
    config: &SysInfoConfig,
    sysinfo: &SysInfoSubscriber,
) -> Result<()> {
    builder.module(LOAD, watch(sysinfo, format_load))?;
    builder.module(LOAD_DETAIL, watch(sysinfo, format_load_detail))?;
    builder.module(UPTIME, watch(sysinfo, format_uptime))?;
    builder.module(MEMORY, watch(sysinfo, format_memory))?;
    builder.module(SWAP, watch(sysinfo, format_swap))?;
    builder.module(TEMPERATURE, watch(sysinfo, format_temperature))?;
    builder.module(DISK_IO, watch(sysinfo, format_disk_io))?;
    builder.module(
        DISK_ROOT,
        watch(sysinfo, |data| {
            data.disk_for(Path::new("/"))
                .map(|disk| format_disk(disk, icons::HARDDISK))
        }),
    )?;

    let mut always = vec![DISK_ROOT];
    let home = std::env::var_os("HOME").map(PathBuf::from);
    if let (true, Some(home)) = (config.show_home_disk, home) {
        builder.module(
            DISK_HOME,
            watch(sysinfo, move |data| {
                home_disk(data, &home).map(|disk| format_disk(disk, icons::HOME))
            }),
        )?;
        always.push(DISK_HOME);
    }

    builder.mode(
        ModeSpec::new(ModeKey::SysInfo)
            .override_segment(Segment::icon(icons::CHART))
            .detail([LOAD, LOAD_DETAIL, UPTIME, MEMORY, SWAP, TEMPERATURE, DISK_IO])
            .always(always),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bar::Color;
    use services::MemoryInfo;

    const GB: u64 = 1024 * 1024 * 1024;

    fn disk(mount: &str, name: &str, available: u64, total: u64) -> DiskInfo {
        DiskInfo {
            mount_point: PathBuf::from(mount),
            name: name.into(),
            available,
            total,
            read_rate: 0,
            write_rate: 0,
        }
    }

    fn sample() -> SysInfoData {
        SysInfoData {
            loads: [0.52, 0.61, 0.70],
            uptime: Duration::from_secs(3 * 3600 + 25 * 60),
            memory: MemoryInfo {
                total: 16 * GB,
                available: 6 * GB,
                swap_total: 4 * GB,
                swap_used: GB,
            },
            temperature: Some(48.6),
            disks: vec![
                disk("/", "/dev/nvme0n1p2", 40 * GB, 100 * GB),
                disk("/home", "/dev/nvme0n1p3", 300 * GB, 400 * GB),
            ],
        }
    }

    #[test]
    fn test_unsampled_is_empty() {
        let data = SysInfoData::default();
        assert!(format_load(&data).is_none());
        assert!(format_uptime(&data).is_none());
        assert!(format_memory(&data).is_none());
        assert!(format_temperature(&data).is_none());
    }

    #[test]
    fn test_load() {
        let data = sample();
        let load = format_load(&data).unwrap();
        assert_eq!(load.text_str(), "0.52");
        assert_eq!(load.color_value(), None);
        assert_eq!(format_load_detail(&data).unwrap().text_str(), "0.61 0.70");

        let busy = SysInfoData {
            loads: [70.0, 20.0, 20.0],
            ..sample()
        };
        assert_eq!(format_load(&busy).unwrap().color_value(), Some(Color::Bad));

        // No colors right after boot.
        let booting = SysInfoData {
            uptime: Duration::from_secs(120),
            ..busy
        };
        assert_eq!(format_load(&booting).unwrap().color_value(), None);
    }

    #[test]
    fn test_uptime() {
        assert_eq!(format_uptime(&sample()).unwrap().text_str(), "3:25");
        let long = SysInfoData {
            uptime: Duration::from_secs(2 * 86400 + 5 * 3600 + 59),
            ..sample()
        };
        assert_eq!(format_uptime(&long).unwrap().text_str(), "2d05h");
    }

    #[test]
    fn test_memory_and_swap() {
        let memory = format_memory(&sample()).unwrap();
        assert_eq!(memory.text_str(), "6.00 GiB");
        assert_eq!(memory.color_value(), None);

        let mut low = sample();
        low.memory.available = GB / 4;
        assert!(format_memory(&low).unwrap().is_urgent());

        assert_eq!(format_swap(&sample()).unwrap().text_str(), "1.00 GiB (25%)");
        let mut no_swap = sample();
        no_swap.memory.swap_total = 0;
        assert!(format_swap(&no_swap).is_none());
    }

    #[test]
    fn test_temperature() {
        assert_eq!(format_temperature(&sample()).unwrap().text_str(), "48℃");
        let mut hot = sample();
        hot.temperature = Some(75.0);
        assert_eq!(
            format_temperature(&hot).unwrap().color_value(),
            Some(Color::Bad)
        );
    }

    #[test]
    fn test_disk_io() {
        let mut data = sample();
        data.disks[0].read_rate = 1024 * 1024;
        data.disks[0].write_rate = 512 * 1024;
        // Only the root device counts.
        data.disks[1].write_rate = 100 * GB;
        assert_eq!(
            format_disk_io(&data).unwrap().full_text(),
            format!("{} 1.50 MiB/s", icons::SWAP_VERTICAL)
        );
        assert!(format_disk_io(&SysInfoData::default()).is_none());
    }

    #[test]
    fn test_disks() {
        let data = sample();
        let root = data.disk_for(Path::new("/")).unwrap();
        let segment = format_disk(root, icons::HARDDISK);
        assert_eq!(segment.text_str(), "40.0 GiB");
        assert_eq!(segment.color_value(), None);

        let nearly_full = disk("/", "/dev/sda1", 3 * GB, 100 * GB);
        assert_eq!(
            format_disk(&nearly_full, icons::HARDDISK).color_value(),
            Some(Color::Bad)
        );
        assert!(format_disk(&disk("/", "/dev/sda1", GB / 2, 100 * GB), "").is_urgent());

        let home = home_disk(&data, Path::new("/home/user")).unwrap();
        assert_eq!(home.mount_point, PathBuf::from("/home"));

        let single = SysInfoData {
            disks: vec![disk("/", "/dev/sda1", 40 * GB, 100 * GB)],
            ..sample()
        };
        assert!(home_disk(&single, Path::new("/home/user")).is_none());
    }
}
