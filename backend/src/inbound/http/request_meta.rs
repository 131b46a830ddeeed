//! Caller attributes read from an HTTP request.

use actix_web::HttpRequest;
use actix_web::http::header;

/// Placeholder used when the peer address is unknown.
pub const UNKNOWN_IP: &str = "unknown";

/// Address of the directly connected peer.
///
/// Forwarding headers are ignored so a caller cannot choose its own
/// rate-limit bucket.
pub fn client_ip(req: &HttpRequest) -> String {
    req.peer_addr()
        .map_or_else(|| UNKNOWN_IP.to_owned(), |addr| addr.ip().to_string())
}

/// `User-Agent` header when present and valid ASCII.
pub fn user_agent(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
}

/// Path plus query string, as seen by the request protector.
pub fn path_and_query(req: &HttpRequest) -> String {
    match req.query_string() {
        "" => req.path().to_owned(),
        query => format!("{}?{query}", req.path()),
    }
}
