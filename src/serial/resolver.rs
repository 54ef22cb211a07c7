/// Conventional fallbacks tried right after the preferred port.
pub const DEFAULT_PORTS: [&str; 2] = ["COM1", "COM2"];

/// Build the ordered list of port names to try.
///
/// `primary` always comes first (even when empty), followed by the
/// conventional defaults and then every enumerated port not already listed.
pub fn build_port_list(primary: &str, available: &[String]) -> Vec<String> {
    let mut try_ports = vec![primary.to_string()];

    let fallbacks = DEFAULT_PORTS.iter().copied().chain(available.iter().map(String::as_str));
    for port in fallbacks {
        if !try_ports.iter().any(|p| p == port) {
            try_ports.push(port.to_string());
        }
    }

    try_ports
}
