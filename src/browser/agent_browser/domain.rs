use crate::config::BrowserConfig;
use std::net::IpAddr;

pub fn normalize_domains(domains: Vec<String>) -> Vec<String> {
    domains
        .into_iter()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

/// Loopback, private, link-local, unspecified, broadcast, or the cloud
/// metadata address. IPv4-mapped IPv6 addresses are unwrapped first.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.octets() == [169, 254, 169, 254]
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(v4));
            }
            let segs = v6.segments();
            v6.is_loopback()
                || v6.is_unspecified()
                || (segs[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (segs[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

pub fn is_private_host(host: &str) -> bool {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let bare = bare.trim_end_matches('.');
    if bare == "localhost" || bare.ends_with(".localhost") {
        return true;
    }
    bare.parse::<IpAddr>().is_ok_and(|ip| is_private_ip(&ip))
}

pub fn host_matches_allowlist(host: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|pattern| {
        if pattern == "*" {
            return true;
        }
        if let Some(base) = pattern.strip_prefix("*.") {
            host == base || host.ends_with(&format!(".{base}"))
        } else {
            host == pattern || host.ends_with(&format!(".{pattern}"))
        }
    })
}

/// Which hosts the driver may open. `file:` and `about:` URLs carry no host
/// and are always allowed.
#[derive(Debug, Clone, Default)]
pub struct NavigationPolicy {
    allowed_domains: Vec<String>,
    block_private_hosts: bool,
}

impl NavigationPolicy {
    pub fn new(allowed_domains: Vec<String>, block_private_hosts: bool) -> Self {
        Self {
            allowed_domains: normalize_domains(allowed_domains),
            block_private_hosts,
        }
    }

    pub fn from_config(config: &BrowserConfig) -> Self {
        Self::new(config.allowed_domains.clone(), config.block_private_hosts)
    }

    pub fn check(&self, url: &str) -> Result<(), String> {
        let parsed = url::Url::parse(url.trim()).map_err(|e| format!("invalid URL: {e}"))?;

        match parsed.scheme() {
            "file" | "about" => return Ok(()),
            "http" | "https" => {}
            other => return Err(format!("unsupported URL scheme: {other}")),
        }

        let host = parsed
            .host_str()
            .map(str::to_lowercase)
            .ok_or_else(|| "URL has no host".to_string())?;

        if self.block_private_hosts && is_private_host(&host) {
            return Err(format!("blocked local/private host: {host}"));
        }

        if !self.allowed_domains.is_empty()
            && !host_matches_allowlist(&host, &self.allowed_domains)
        {
            return Err(format!("host '{host}' not in browser.allowed_domains"));
        }

        Ok(())
    }
}
