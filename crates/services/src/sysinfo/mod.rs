//! System information service: load, uptime, memory, temperature, disk
//! space and disk IO.
//!
//! Polls the `sysinfo` crate on a dedicated thread and publishes a snapshot
//! whenever anything changed.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use futures_signals::signal::{Mutable, MutableSignalCloned};
use sysinfo::{Components, Disks, System};
use tracing::{debug, info};

/// Free space of one mounted filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskInfo {
    pub mount_point: PathBuf,
    /// Device or filesystem name as reported by the OS.
    pub name: String,
    pub available: u64,
    pub total: u64,
    /// Bytes read per second over the last sample.
    pub read_rate: u64,
    /// Bytes written per second over the last sample.
    pub write_rate: u64,
}

impl DiskInfo {
    /// Fraction of the disk still available (0.0-1.0).
    pub fn avail_frac(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.available as f64 / self.total as f64
    }
}

/// Memory figures in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

impl MemoryInfo {
    /// Fraction of swap in use (0.0-1.0), zero without swap.
    pub fn swap_frac(&self) -> f64 {
        if self.swap_total == 0 {
            return 0.0;
        }
        self.swap_used as f64 / self.swap_total as f64
    }
}

/// System information snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SysInfoData {
    /// 1, 5 and 15 minute load averages.
    pub loads: [f64; 3],
    pub uptime: Duration,
    pub memory: MemoryInfo,
    /// CPU temperature in Celsius.
    pub temperature: Option<f32>,
    pub disks: Vec<DiskInfo>,
}

impl SysInfoData {
    /// The disk holding `path`: the mount point with the longest matching
    /// prefix.
    pub fn disk_for(&self, path: &Path) -> Option<&DiskInfo> {
        self.disks
            .iter()
            .filter(|d| path.starts_with(&d.mount_point))
            .max_by_key(|d| d.mount_point.components().count())
    }
}

/// Polling system information subscriber.
#[derive(Debug, Clone)]
pub struct SysInfoSubscriber {
    data: Mutable<SysInfoData>,
}

impl SysInfoSubscriber {
    /// Start polling every `interval`.
    pub fn new(interval: Duration) -> Self {
        let data = Mutable::new(SysInfoData::default());
        start_listener(data.clone(), interval);
        Self { data }
    }

    pub fn subscribe(&self) -> MutableSignalCloned<SysInfoData> {
        self.data.signal_cloned()
    }

    pub fn get(&self) -> SysInfoData {
        self.data.get_cloned()
    }
}

fn start_listener(data: Mutable<SysInfoData>, interval: Duration) {
    thread::spawn(move || {
        info!("SysInfo subscriber started");
        let mut system = System::new();
        let mut components = Components::new_with_refreshed_list();
        let mut disks = Disks::new_with_refreshed_list();
        let mut last_refresh = Instant::now();

        loop {
            let elapsed = last_refresh.elapsed();
            last_refresh = Instant::now();
            let new_data = fetch_system_info(&mut system, &mut components, &mut disks, elapsed);
            if *data.lock_ref() != new_data {
                debug!(
                    "SysInfo updated: load {:.2}, temp {:?}",
                    new_data.loads[0], new_data.temperature
                );
                data.set(new_data);
            }
            thread::sleep(interval);
        }
    });
}

fn fetch_system_info(
    system: &mut System,
    components: &mut Components,
    disks: &mut Disks,
    elapsed: Duration,
) -> SysInfoData {
    system.refresh_memory();
    components.refresh(true);
    disks.refresh(true);

    let load = System::load_average();

    // Try common temperature sensors
    let temperature = components
        .iter()
        .find(|c| {
            let label = c.label().to_lowercase();
            label.contains("coretemp")
                || label.contains("k10temp")
                || label.contains("cpu")
                || label.contains("package")
        })
        .and_then(|c| c.temperature());

    let secs = elapsed.as_secs_f64().max(0.001);
    let rate = |bytes: u64| (bytes as f64 / secs) as u64;
    let disks = disks
        .iter()
        .filter(|d| !d.is_removable() && d.total_space() > 0)
        .map(|d| {
            let usage = d.usage();
            DiskInfo {
                mount_point: d.mount_point().to_path_buf(),
                name: d.name().to_string_lossy().to_string(),
                available: d.available_space(),
                total: d.total_space(),
                read_rate: rate(usage.read_bytes),
                write_rate: rate(usage.written_bytes),
            }
        })
        .collect();

    SysInfoData {
        loads: [load.one, load.five, load.fifteen],
        uptime: Duration::from_secs(System::uptime()),
        memory: MemoryInfo {
            total: system.total_memory(),
            available: system.available_memory(),
            swap_total: system.total_swap(),
            swap_used: system.used_swap(),
        },
        temperature,
        disks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(mount: &str, name: &str) -> DiskInfo {
        DiskInfo {
            mount_point: PathBuf::from(mount),
            name: name.to_string(),
            available: 25,
            total: 100,
            read_rate: 0,
            write_rate: 0,
        }
    }

    #[test]
    fn test_disk_for_picks_longest_mount() {
        let data = SysInfoData {
            disks: vec![disk("/", "root"), disk("/home", "home"), disk("/boot", "boot")],
            ..Default::default()
        };
        assert_eq!(
            data.disk_for(Path::new("/home/me")).unwrap().name,
            "home"
        );
        assert_eq!(data.disk_for(Path::new("/var/lib")).unwrap().name, "root");
        // Component-wise matching, not string prefixes.
        assert_eq!(data.disk_for(Path::new("/homework")).unwrap().name, "root");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(disk("/", "root").avail_frac(), 0.25);
        assert_eq!(DiskInfo { total: 0, ..disk("/", "x") }.avail_frac(), 0.0);

        let memory = MemoryInfo {
            swap_total: 400,
            swap_used: 100,
            ..Default::default()
        };
        assert_eq!(memory.swap_frac(), 0.25);
        assert_eq!(MemoryInfo::default().swap_frac(), 0.0);
    }
}
