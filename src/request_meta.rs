use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;
use serde_json::json;

/// Extract lead metadata (client IP, user agent, referer) from request
/// headers. X-Forwarded-For is only honored when the direct peer is a
/// trusted proxy.
pub fn extract(
    headers: &HeaderMap,
    peer_addr: Option<IpAddr>,
    trusted_proxies: &[IpNet],
) -> serde_json::Value {
    let ip = extract_ip(headers, peer_addr, trusted_proxies);
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let referer = headers
        .get("referer")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    json!({
        "ip": ip,
        "user_agent": user_agent,
        "referer": referer,
    })
}

fn extract_ip(
    headers: &HeaderMap,
    peer_addr: Option<IpAddr>,
    trusted_proxies: &[IpNet],
) -> String {
    let peer = peer_addr.unwrap_or(IpAddr::from([127, 0, 0, 1]));

    if !trusted_proxies.is_empty() && trusted_proxies.iter().any(|net| net.contains(&peer)) {
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            // Take the first (leftmost) IP that isn't a trusted proxy
            for ip_str in xff.split(',').map(|s| s.trim()) {
                if let Ok(ip) = ip_str.parse::<IpAddr>() {
                    if !trusted_proxies.iter().any(|net| net.contains(&ip)) {
                        return ip.to_string();
                    }
                }
            }
        }
    }

    peer.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrusted_peer_ignores_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
        let meta = extract(&headers, Some("198.51.100.1".parse().unwrap()), &[]);
        assert_eq!(meta["ip"], "198.51.100.1");
    }

    #[test]
    fn trusted_proxy_uses_forwarded_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        let proxies = vec!["10.0.0.0/8".parse().unwrap()];
        let meta = extract(&headers, Some("10.0.0.1".parse().unwrap()), &proxies);
        assert_eq!(meta["ip"], "203.0.113.7");
    }
}
