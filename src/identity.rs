//! Client identifier derivation from request headers.

use http::HeaderMap;

/// Forwarded-address header set by proxies; may carry a comma-separated
/// chain with the originating client first.
const FORWARDED_FOR: &str = "x-forwarded-for";
/// Real-address header set by single-hop proxies.
const REAL_IP: &str = "x-real-ip";

/// Derive a stable identifier for the client behind a request.
///
/// Takes the first entry of `x-forwarded-for` (trimmed), falling back to
/// `x-real-ip` verbatim, falling back to the empty string. No IP syntax
/// validation is performed; a malformed value is an opaque key like any
/// other, and the empty string is a valid (if degenerate) bucket key.
pub fn client_identifier(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get(FORWARDED_FOR) {
        if let Ok(chain) = forwarded.to_str() {
            if let Some(first) = chain.split(',').next() {
                return first.trim().to_string();
            }
        }
    }

    if let Some(real) = headers.get(REAL_IP) {
        if let Ok(addr) = real.to_str() {
            return addr.to_string();
        }
    }

    String::new()
}

/// Namespace an identifier by endpoint purpose, so one client's quota on
/// one endpoint never consumes its quota on another.
pub fn scope_identifier(purpose: &str, identifier: &str) -> String {
    format!("{}:{}", purpose, identifier)
}
