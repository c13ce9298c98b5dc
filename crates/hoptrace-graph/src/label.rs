use hoptrace_model::HopRecord;

/// `host (ip) – rtt`, dropping the parenthetical when host and ip agree.
pub fn hop_label(hop: &HopRecord) -> String {
    let mut label = match hop.hostname.as_deref() {
        Some(host) if !host.is_empty() && host != hop.address => {
            format!("{host} ({})", hop.address)
        }
        _ => hop.address.clone(),
    };
    if let Some(rtt) = hop.round_trip_time.as_deref() {
        label.push_str(" – ");
        label.push_str(rtt);
    }
    label
}
