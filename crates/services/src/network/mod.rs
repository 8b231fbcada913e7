//! Network service: default interface, its addresses, throughput and the
//! wireless network it is associated with.
//!
//! The default interface is read once from the kernel routing table. After
//! that the service polls `sysinfo` for counters and addresses, asks
//! `iwgetid` for the SSID and reads the link's operational state from sysfs.

use std::net::IpAddr;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures_signals::signal::{Mutable, MutableSignalCloned};
use itertools::Itertools;
use sysinfo::Networks;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::command;

const ROUTE_TABLE: &str = "/proc/net/route";
const SYS_NET: &str = "/sys/class/net";
const IWGETID_TIMEOUT: Duration = Duration::from_secs(2);

/// Network state of the default interface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkData {
    /// Interface carrying the default route.
    pub interface: Option<String>,
    /// SSID when the interface is associated with a wireless network.
    pub ssid: Option<String>,
    /// The link is up but still authenticating, e.g. during a WPA handshake.
    pub connecting: bool,
    pub ips: Vec<IpAddr>,
    /// Receive rate in bytes per second.
    pub rx_rate: u64,
    /// Transmit rate in bytes per second.
    pub tx_rate: u64,
}

impl NetworkData {
    pub fn is_wireless(&self) -> bool {
        self.ssid.is_some() || self.connecting
    }

    /// First IPv4 address, falling back to any address.
    pub fn primary_ip(&self) -> Option<IpAddr> {
        self.ips
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| self.ips.first())
            .copied()
    }
}

/// Interface of the default route in a `/proc/net/route` table.
pub fn parse_default_route(table: &str) -> Option<String> {
    table.lines().skip(1).find_map(|line| {
        let mut fields = line.split_whitespace();
        let iface = fields.next()?;
        let destination = fields.next()?;
        (destination == "00000000").then(|| iface.to_string())
    })
}

/// Whether a sysfs `operstate` value means the link is still authenticating.
pub fn is_dormant(operstate: &str) -> bool {
    operstate.trim() == "dormant"
}

async fn fetch_connecting(interface: &str) -> bool {
    let path = Path::new(SYS_NET).join(interface).join("operstate");
    match tokio::fs::read_to_string(&path).await {
        Ok(state) => is_dormant(&state),
        Err(e) => {
            debug!("No operstate for {}: {}", interface, e);
            false
        }
    }
}

async fn default_interface() -> Result<Option<String>> {
    let table = tokio::fs::read_to_string(ROUTE_TABLE)
        .await
        .with_context(|| format!("Failed to read {}", ROUTE_TABLE))?;
    Ok(parse_default_route(&table))
}

/// Polling network subscriber.
#[derive(Debug, Clone)]
pub struct NetworkSubscriber {
    data: Mutable<NetworkData>,
}

impl NetworkSubscriber {
    /// Discover the default interface and start polling every `interval`.
    pub async fn new(interval: Duration) -> Self {
        let interface = match default_interface().await {
            Ok(interface) => interface,
            Err(e) => {
                warn!("No default route: {:#}", e);
                None
            }
        };
        info!("Network subscriber started on {:?}", interface);

        let data = Mutable::new(NetworkData {
            interface: interface.clone(),
            ..Default::default()
        });
        tokio::spawn(run_listener(data.clone(), interface, interval));

        Self { data }
    }

    pub fn subscribe(&self) -> MutableSignalCloned<NetworkData> {
        self.data.signal_cloned()
    }

    pub fn get(&self) -> NetworkData {
        self.data.get_cloned()
    }
}

async fn fetch_ssid() -> Option<String> {
    match command::run("iwgetid", &["-r"], IWGETID_TIMEOUT).await {
        Ok(ssid) if !ssid.is_empty() => Some(ssid),
        Ok(_) => None,
        Err(e) => {
            debug!("No SSID: {:#}", e);
            None
        }
    }
}

async fn run_listener(data: Mutable<NetworkData>, interface: Option<String>, interval: Duration) {
    let Some(interface) = interface else {
        return;
    };

    let mut networks = Networks::new_with_refreshed_list();
    let mut last_refresh = Instant::now();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        networks.refresh(true);
        let elapsed = last_refresh.elapsed().as_secs_f64().max(0.001);
        last_refresh = Instant::now();

        let Some(counters) = networks.get(interface.as_str()) else {
            debug!("Interface {} disappeared", interface);
            data.set_neq(NetworkData {
                interface: Some(interface.clone()),
                ..Default::default()
            });
            continue;
        };

        let new_data = NetworkData {
            interface: Some(interface.clone()),
            ssid: fetch_ssid().await,
            connecting: fetch_connecting(&interface).await,
            ips: counters.ip_networks().iter().map(|n| n.addr).unique().collect(),
            rx_rate: (counters.received() as f64 / elapsed) as u64,
            tx_rate: (counters.transmitted() as f64 / elapsed) as u64,
        };
        data.set_neq(new_data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTES: &str = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
wlp3s0\t0000A8C0\t00000000\t0001\t0\t0\t600\t00FFFFFF\t0\t0\t0
wlp3s0\t00000000\t0100A8C0\t0003\t0\t0\t600\t00000000\t0\t0\t0
docker0\t000011AC\t00000000\t0001\t0\t0\t0\t0000FFFF\t0\t0\t0
";

    #[test]
    fn test_parse_default_route() {
        assert_eq!(parse_default_route(ROUTES), Some("wlp3s0".to_string()));
    }

    #[test]
    fn test_parse_default_route_missing() {
        let header_only = ROUTES.lines().next().unwrap();
        assert_eq!(parse_default_route(header_only), None);
        assert_eq!(parse_default_route(""), None);
    }

    #[test]
    fn test_dormant_link_is_connecting() {
        assert!(is_dormant("dormant\n"));
        assert!(!is_dormant("up\n"));
        assert!(!is_dormant("down"));

        let data = NetworkData {
            connecting: true,
            ..Default::default()
        };
        assert!(data.is_wireless());
        assert!(!NetworkData::default().is_wireless());
    }

    #[test]
    fn test_primary_ip_prefers_ipv4() {
        let data = NetworkData {
            ips: vec!["fe80::1".parse().unwrap(), "192.168.0.7".parse().unwrap()],
            ..Default::default()
        };
        assert_eq!(data.primary_ip(), Some("192.168.0.7".parse().unwrap()));

        let v6_only = NetworkData {
            ips: vec!["fe80::1".parse().unwrap()],
            ..Default::default()
        };
        assert_eq!(v6_only.primary_ip(), Some("fe80::1".parse().unwrap()));
        assert_eq!(NetworkData::default().primary_ip(), None);
    }
}
