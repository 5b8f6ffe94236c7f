//! Cluster member addresses

/// Normalize an endpoint string as StorageService reports it
///
/// Handles `/10.0.0.1`, `host.example/10.0.0.1`, `10.0.0.1:7000`,
/// `[::1]:7000` and bare IPv6 literals. The result is the address used in
/// metric names and for opening per-host connections.
pub fn normalize_address(raw: &str) -> String {
    let addr = raw.trim();
    let addr = addr.rsplit('/').next().unwrap_or(addr);

    if let Some(rest) = addr.strip_prefix('[') {
        if let Some((host, _)) = rest.split_once(']') {
            return host.to_string();
        }
    }

    // Exactly one colon means host:port; more than one is a bare IPv6 literal
    match addr.split_once(':') {
        Some((host, port)) if !port.contains(':') => host.to_string(),
        _ => addr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("/10.0.0.1"), "10.0.0.1");
        assert_eq!(normalize_address("node1.example/10.0.0.2"), "10.0.0.2");
        assert_eq!(normalize_address("10.0.0.3:7000"), "10.0.0.3");
        assert_eq!(normalize_address("/10.0.0.4:7000"), "10.0.0.4");
        assert_eq!(normalize_address("[fe80::1]:7000"), "fe80::1");
        assert_eq!(normalize_address("fe80::1"), "fe80::1");
        assert_eq!(normalize_address(" cass-1 "), "cass-1");
    }
}
