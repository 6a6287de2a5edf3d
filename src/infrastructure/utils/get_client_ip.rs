use actix_web::HttpRequest;

use crate::constants::UNKNOWN_CLIENT;

/// Extract the client's IP address for rate limiting.
///
/// With `trust_forwarded_for` set, the first hop of `X-Forwarded-For` wins,
/// then `X-Real-IP`. Otherwise (or when neither is usable) the peer address is
/// used, and `"unknown"` when even that is missing.
pub fn get_client_ip(req: &HttpRequest, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(ip) = header_ip(req, "x-forwarded-for").or_else(|| header_ip(req, "x-real-ip")) {
            return ip;
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_ip(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
