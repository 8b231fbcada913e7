//! Default-interface network status.
//!
//! Collapsed, the network mode shows the SSID when on Wi-Fi (or a degraded
//! `...` while associating) and otherwise its override icon, which tracks
//! whether the link is wireless. Expanded, it shows the SSID, interface,
//! address and throughput.

mod config;
pub use config::NetworkConfig;

use anyhow::Result;
use bar::{BarBuilder, Color, ModeKey, ModeSpec, ModuleId, Output, Segment, push};
use futures_signals::signal::SignalExt;
use services::{NetworkData, NetworkSubscriber};

use super::{byterate, split_into};
use crate::bar::icons;

pub const WIFI: ModuleId = ModuleId::new("wifi");
pub const WIFI_DETAIL: ModuleId = ModuleId::new("wifi_detail");
pub const NETINFO: ModuleId = ModuleId::new("netinfo");
pub const NETSPEED: ModuleId = ModuleId::new("netspeed");

/// Wi-Fi icon while associated or associating, Ethernet otherwise.
pub fn link_icon(data: &NetworkData) -> Segment {
    if data.is_wireless() {
        Segment::icon(icons::WIFI)
    } else {
        Segment::icon(icons::ETHERNET)
    }
}

/// SSID for the summary, then again for the detail.
pub fn format_wifi(data: &NetworkData) -> Option<Output> {
    if data.connecting {
        return Some(Output::from(
            Segment::new(icons::WIFI, "...").color(Color::Degraded),
        ));
    }
    let ssid = data.ssid.as_deref()?;
    Some(
        Output::empty()
            .push(Segment::new(icons::WIFI, ssid))
            .push(Segment::new(icons::WIFI, ssid)),
    )
}

/// Interface name and primary address; degraded without an address or while
/// still connecting.
pub fn format_netinfo(data: &NetworkData) -> Option<Output> {
    let interface = data.interface.as_deref()?;
    Some(match data.primary_ip().filter(|_| !data.connecting) {
        Some(ip) => Output::empty()
            .push(Segment::text(interface))
            .push(Segment::new(icons::IP, ip.to_string())),
        None => Output::from(Segment::text(interface).color(Color::Degraded)),
    })
}

pub fn format_netspeed(data: &NetworkData) -> Option<Output> {
    data.interface.as_ref()?;
    Some(
        Output::empty()
            .push(Segment::new(
                icons::UPLOAD,
                format!("{:>9}", byterate(data.tx_rate)),
            ))
            .push(Segment::new(
                icons::DOWNLOAD,
                format!("{:>9}", byterate(data.rx_rate)),
            )),
    )
}

/// Register the network modules and mode.
pub fn register(builder: &mut BarBuilder, network: &NetworkSubscriber) -> Result<()> {
    let detail = builder.static_module(WIFI_DETAIL)?;
    let controller = builder.controller();
    builder.module(
        WIFI,
        push(network.subscribe().to_stream(), move |data: NetworkData| {
            let _ = controller.set_override(ModeKey::Network, link_icon(&data));
            split_into(&detail, 1, format_wifi(&data))
        }),
    )?;
    builder.module(
        NETINFO,
        push(network.subscribe().to_stream(), |data: NetworkData| {
            format_netinfo(&data)
        }),
    )?;
    builder.module(
        NETSPEED,
        push(network.subscribe().to_stream(), |data: NetworkData| {
            format_netspeed(&data)
        }),
    )?;

    builder.mode(
        ModeSpec::new(ModeKey::Network)
            .override_segment(link_icon(&network.get()))
            .summary([WIFI])
            .detail([WIFI_DETAIL, NETINFO, NETSPEED]),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn wired() -> NetworkData {
        NetworkData {
            interface: Some("eth0".into()),
            ssid: None,
            connecting: false,
            ips: vec![
                "fe80::1".parse::<IpAddr>().unwrap(),
                "192.168.1.20".parse::<IpAddr>().unwrap(),
            ],
            rx_rate: 12_500,
            tx_rate: 0,
        }
    }

    #[test]
    fn test_wired_has_no_wifi_output() {
        let data = wired();
        assert!(format_wifi(&data).is_none());
        assert_eq!(link_icon(&data).icon_str(), Some(icons::ETHERNET));
    }

    #[test]
    fn test_wireless_output() {
        let data = NetworkData {
            ssid: Some("homenet".into()),
            ..wired()
        };
        let output = format_wifi(&data).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output.segments()[0].text_str(), "homenet");
        assert_eq!(link_icon(&data).icon_str(), Some(icons::WIFI));
    }

    #[test]
    fn test_connecting_output() {
        let data = NetworkData {
            connecting: true,
            ..wired()
        };
        let output = format_wifi(&data).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output.segments()[0].full_text(), format!("{} ...", icons::WIFI));
        assert_eq!(output.segments()[0].color_value(), Some(Color::Degraded));
        assert_eq!(link_icon(&data).icon_str(), Some(icons::WIFI));

        let netinfo = format_netinfo(&data).unwrap();
        assert_eq!(netinfo.len(), 1);
        assert_eq!(netinfo.segments()[0].color_value(), Some(Color::Degraded));
    }

    #[test]
    fn test_netinfo() {
        let output = format_netinfo(&wired()).unwrap();
        assert_eq!(output.segments()[0].text_str(), "eth0");
        assert_eq!(output.segments()[1].text_str(), "192.168.1.20");

        let no_ip = NetworkData {
            ips: Vec::new(),
            ..wired()
        };
        let output = format_netinfo(&no_ip).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output.segments()[0].color_value(), Some(Color::Degraded));

        assert!(format_netinfo(&NetworkData::default()).is_none());
    }

    #[test]
    fn test_netspeed() {
        let output = format_netspeed(&wired()).unwrap();
        assert_eq!(output.segments()[0].text_str(), "    0 B/s");
        assert_eq!(output.segments()[1].text_str(), "12.5 kB/s");
    }
}
