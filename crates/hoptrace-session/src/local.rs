//! Discovery of the local end of the path.

use hoptrace_model::SourceInfo;
use pnet::datalink;
use std::net::IpAddr;

/// What [`pick_source`] needs from a network interface.
#[derive(Debug, Clone)]
pub struct InterfaceSummary {
    pub loopback: bool,
    pub mac: Option<String>,
    pub addrs: Vec<IpAddr>,
}

/// Address and MAC of the first external IPv4 interface, plus the machine's
/// hostname.
pub fn discover_source() -> SourceInfo {
    let interfaces = datalink::interfaces().into_iter().map(|iface| InterfaceSummary {
        loopback: iface.is_loopback(),
        mac: iface.mac.map(|mac| mac.to_string()),
        addrs: iface.ips.iter().map(|net| net.ip()).collect(),
    });
    SourceInfo {
        hostname: local_hostname(),
        ..pick_source(interfaces)
    }
}

fn local_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

pub fn pick_source(interfaces: impl IntoIterator<Item = InterfaceSummary>) -> SourceInfo {
    for iface in interfaces {
        if iface.loopback {
            continue;
        }
        let ipv4 = iface
            .addrs
            .iter()
            .find(|addr| addr.is_ipv4() && !addr.is_loopback());
        if let Some(addr) = ipv4 {
            return SourceInfo {
                local_ip: Some(addr.to_string()),
                mac_address: iface.mac,
                hostname: None,
            };
        }
    }
    SourceInfo::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(loopback: bool, mac: Option<&str>, addrs: &[&str]) -> InterfaceSummary {
        InterfaceSummary {
            loopback,
            mac: mac.map(str::to_string),
            addrs: addrs.iter().map(|addr| addr.parse().unwrap()).collect(),
        }
    }

    #[test]
    fn skips_loopback_and_ipv6_only() {
        let picked = pick_source(vec![
            iface(true, None, &["127.0.0.1"]),
            iface(false, Some("02:00:00:00:00:01"), &["fe80::1"]),
            iface(false, Some("aa:bb:cc:dd:ee:ff"), &["fe80::2", "192.168.1.20"]),
        ]);
        assert_eq!(picked.local_ip.as_deref(), Some("192.168.1.20"));
        assert_eq!(picked.mac_address.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn hostname_is_never_blank() {
        if let Some(name) = local_hostname() {
            assert!(!name.is_empty());
            assert_eq!(name, name.trim());
        }
    }

    #[test]
    fn nothing_found_is_unknown() {
        let picked = pick_source(vec![iface(true, None, &["127.0.0.1"])]);
        assert_eq!(picked, SourceInfo::default());
        assert_eq!(picked.label(), "My host: N/A (N/A)");
    }
}
