use hoptrace_model::HopRecord;
use regex::Regex;
use std::sync::OnceLock;

/// A hop line resolved against one of the known output grammars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopLine {
    /// `traceroute`: `<n>  <host> (<ip>)  <rtt> ms ...`
    Posix {
        hop: u32,
        host: String,
        ip: String,
        rtt: String,
    },
    /// `tracert`: `<n>  <t1> ms  <t2> ms  <t3> ms  <host> [<ip>]`
    Windows {
        hop: u32,
        samples: [String; 3],
        host: String,
        ip: Option<String>,
    },
    /// Every probe for the hop went unanswered.
    Timeout { hop: u32 },
}

impl HopLine {
    pub fn hop(&self) -> u32 {
        match self {
            HopLine::Posix { hop, .. } | HopLine::Windows { hop, .. } | HopLine::Timeout { hop } => {
                *hop
            }
        }
    }

    pub fn into_record(self) -> HopRecord {
        match self {
            HopLine::Timeout { hop } => HopRecord::timeout(hop),
            HopLine::Posix { hop, host, ip, rtt } => HopRecord {
                hop_index: hop,
                address: ip,
                hostname: Some(host),
                round_trip_time: Some(format!("{rtt} ms")),
            },
            HopLine::Windows {
                hop,
                samples,
                host,
                ip,
            } => {
                let rtt = samples
                    .iter()
                    .map(|sample| {
                        if sample == "*" {
                            sample.clone()
                        } else {
                            format!("{sample} ms")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                let (address, hostname) = match ip {
                    Some(ip) => (ip, host),
                    None => (host.clone(), host),
                };
                HopRecord {
                    hop_index: hop,
                    address,
                    hostname: Some(hostname),
                    round_trip_time: Some(rtt),
                }
            }
        }
    }
}

const BANNERS: [&str; 4] = [
    "Tracing route to",
    "over a maximum",
    "Trace complete.",
    "traceroute to",
];

fn timeout_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)\s+\*\s+\*\s+\*").expect("timeout pattern is valid")
    })
}

fn posix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)\s+(?:\*\s+)*(\S+)\s+\(([^)\s]+)\)\s+([\d.]+)\s*ms")
            .expect("posix pattern is valid")
    })
}

fn windows_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d+) (<?\d+ ?ms|\*(?: ?ms)?) (<?\d+ ?ms|\*(?: ?ms)?) (<?\d+ ?ms|\*(?: ?ms)?) (.+?)(?: \[([^\]]+)\])?$",
        )
        .expect("windows pattern is valid")
    })
}

/// Parses one line of `traceroute`/`tracert` output.
///
/// Banners, blank lines and anything outside the two grammars yield `None`.
pub fn parse_line(line: &str) -> Option<HopRecord> {
    classify_line(line).map(HopLine::into_record)
}

pub fn classify_line(line: &str) -> Option<HopLine> {
    let line = line.trim();
    if line.is_empty() || BANNERS.iter().any(|banner| line.starts_with(banner)) {
        return None;
    }

    let parsed = parse_timeout(line)
        .or_else(|| parse_posix(line))
        .or_else(|| parse_windows(line))?;

    // hop indices are 1-based
    if parsed.hop() == 0 {
        return None;
    }
    Some(parsed)
}

fn parse_timeout(line: &str) -> Option<HopLine> {
    let caps = timeout_re().captures(line)?;
    let hop = caps[1].parse().ok()?;
    Some(HopLine::Timeout { hop })
}

fn parse_posix(line: &str) -> Option<HopLine> {
    let caps = posix_re().captures(line)?;
    Some(HopLine::Posix {
        hop: caps[1].parse().ok()?,
        host: caps[2].to_string(),
        ip: caps[3].to_string(),
        rtt: caps[4].to_string(),
    })
}

fn parse_windows(line: &str) -> Option<HopLine> {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    let caps = windows_re().captures(&collapsed)?;
    let host = caps[5].trim();
    if host.is_empty() {
        return None;
    }
    Some(HopLine::Windows {
        hop: caps[1].parse().ok()?,
        samples: [sample(&caps[2]), sample(&caps[3]), sample(&caps[4])],
        host: host.to_string(),
        ip: caps.get(6).map(|ip| ip.as_str().trim().to_string()),
    })
}

/// `<1 ms` -> `<1`, `* ms` -> `*`
fn sample(raw: &str) -> String {
    raw.trim_end_matches("ms").trim_end().to_string()
}

/// Target named in a `traceroute to …` or `Tracing route to …` banner.
pub fn parse_target(text: &str) -> Option<String> {
    for line in text.lines().map(str::trim) {
        let rest = line
            .strip_prefix("traceroute to ")
            .or_else(|| line.strip_prefix("Tracing route to "));
        let Some(rest) = rest else {
            continue;
        };
        let token = rest
            .split(|c: char| c.is_whitespace() || c == ',')
            .next()
            .unwrap_or_default()
            .trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }
    None
}

/// Parses a complete captured output, keeping the first record per hop.
pub fn parse_output(text: &str) -> Vec<HopRecord> {
    let mut hops: Vec<HopRecord> = Vec::new();
    for record in text.lines().filter_map(parse_line) {
        if hops.iter().any(|hop| hop.hop_index == record.hop_index) {
            continue;
        }
        hops.push(record);
    }
    hops
}
