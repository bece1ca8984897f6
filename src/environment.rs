// 🌍 Environment Resolver - Local vs deployed backend
//
// Pure function of the host the client runs under. No network calls, no
// caching, never fails.

use crate::config::ClientConfig;
use std::net::IpAddr;

/// Whether `host` names the local machine
///
/// Accepts bare hosts and `host:port` forms:
/// `localhost`, `app.localhost`, `127.0.0.1:5173`, `[::1]:8080`, `::1`
pub fn is_loopback_host(host: &str) -> bool {
    let host = strip_port(host.trim()).to_ascii_lowercase();

    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    host.parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

fn strip_port(host: &str) -> &str {
    // [::1]:8080 / [::1]
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }

    // Bare IPv6 has several colons and no port
    if host.matches(':').count() > 1 {
        return host;
    }

    host.split(':').next().unwrap_or(host)
}

/// Backend base address for the configured host
pub fn resolve_base_url(config: &ClientConfig) -> String {
    if let Some(url) = &config.base_url_override {
        return url.clone();
    }

    if is_loopback_host(&config.host) {
        config.local_api_url.clone()
    } else {
        config.deployed_api_url.clone()
    }
}

// ============================================================================
// TESTS
// ============================================================================
