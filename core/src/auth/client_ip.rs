use super::constants::{FALLBACK_CLIENT_IP, HEADER_FORWARDED_FOR, HEADER_REAL_IP};
use http::HeaderMap;

/// Best-effort caller address: first `x-forwarded-for` hop, then `x-real-ip`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get(HEADER_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    headers
        .get(HEADER_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(FALLBACK_CLIENT_IP)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HEADER_FORWARDED_FOR,
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        headers.insert(HEADER_REAL_IP, HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn falls_back_to_real_ip_then_loopback() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_REAL_IP, HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "198.51.100.2");

        assert_eq!(client_ip(&HeaderMap::new()), FALLBACK_CLIENT_IP);
    }

    #[test]
    fn blank_forwarded_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_FORWARDED_FOR, HeaderValue::from_static("  "));
        assert_eq!(client_ip(&headers), FALLBACK_CLIENT_IP);
    }
}
