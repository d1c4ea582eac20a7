/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Application configuration loaded from environment variables.

use std::env;

use url::Url;

use crate::cookie::{is_valid_cookie_name, SameSite};

/// Configuration for the bridge service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server (e.g. "0.0.0.0:8082").
    pub listen_addr: String,
    /// PostgreSQL connection string. `None` keeps refresh token hashes in memory.
    pub database_url: Option<String>,
    pub settings: BridgeSettings,
}

/// Cookie and validation settings handed to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    pub cookie_name: String,
    /// Cookie lifetime in seconds (default: 3600).
    pub cookie_duration_secs: u64,
    pub same_site: SameSite,
    pub http_only: bool,
    /// Domain the cookie is written for. Must pass the allow-list.
    pub cookie_domain: String,
    /// Base domains the cookie domain may equal or be a subdomain of.
    pub allowed_domains: Vec<String>,
    /// Records a status snapshot per login and enables the diagnostic routes.
    pub debug_mode: bool,
    /// Shared HMAC secret. When set, token signatures are verified.
    pub verify_secret: Option<String>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            cookie_name: "mo_jwt".to_string(),
            cookie_duration_secs: 3600,
            same_site: SameSite::Lax,
            http_only: true,
            cookie_domain: "localhost".to_string(),
            allowed_domains: Vec::new(),
            debug_mode: false,
            verify_secret: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Optional
    /// - `LISTEN_ADDR` (default: `"0.0.0.0:8082"`)
    /// - `DATABASE_URL`
    /// - `COOKIE_NAME` (default: `"mo_jwt"`)
    /// - `COOKIE_DURATION_SECS` (default: `"3600"`)
    /// - `COOKIE_SAMESITE` (`Strict`, `Lax` or `None`; default: `"Lax"`)
    /// - `COOKIE_HTTP_ONLY` (default: `"true"`)
    /// - `COOKIE_DOMAIN`, else the host of `SITE_URL`, else `"localhost"`
    /// - `ALLOWED_DOMAINS` (comma-separated)
    /// - `DEBUG_MODE` (default: `"false"`)
    /// - `JWT_VERIFY_SECRET`
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = BridgeSettings::default();

        let listen_addr = var("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8082".to_string());
        let database_url = var("DATABASE_URL");

        let cookie_name = var("COOKIE_NAME")
            .map(|n| n.trim().to_string())
            .unwrap_or(defaults.cookie_name);
        if !is_valid_cookie_name(&cookie_name) {
            return Err(format!("COOKIE_NAME {cookie_name:?} is not a valid cookie name"));
        }

        let cookie_duration_secs = match var("COOKIE_DURATION_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| "COOKIE_DURATION_SECS must be a non-negative integer")?,
            None => defaults.cookie_duration_secs,
        };

        let same_site = var("COOKIE_SAMESITE")
            .map(|v| SameSite::parse_or_lax(&v))
            .unwrap_or(defaults.same_site);

        let http_only = match var("COOKIE_HTTP_ONLY") {
            Some(v) => parse_bool(&v).ok_or("COOKIE_HTTP_ONLY must be a boolean")?,
            None => defaults.http_only,
        };
        let debug_mode = match var("DEBUG_MODE") {
            Some(v) => parse_bool(&v).ok_or("DEBUG_MODE must be a boolean")?,
            None => defaults.debug_mode,
        };

        let cookie_domain = match (var("COOKIE_DOMAIN"), var("SITE_URL")) {
            (Some(domain), _) => domain.trim().trim_start_matches('.').to_string(),
            (None, Some(site_url)) => site_host(&site_url)?,
            (None, None) => defaults.cookie_domain,
        };

        let allowed_domains = var("ALLOWED_DOMAINS")
            .map(|list| {
                list.split(',')
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            listen_addr,
            database_url,
            settings: BridgeSettings {
                cookie_name,
                cookie_duration_secs,
                same_site,
                http_only,
                cookie_domain,
                allowed_domains,
                debug_mode,
                verify_secret: var("JWT_VERIFY_SECRET"),
            },
        })
    }
}

fn site_host(site_url: &str) -> Result<String, String> {
    let url = Url::parse(site_url.trim()).map_err(|e| format!("SITE_URL: {e}"))?;
    url.host_str()
        .map(str::to_string)
        .ok_or_else(|| "Unable to determine cookie domain from SITE_URL".to_string())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = load(&[]).expect("defaults should load");
        assert_eq!(config.listen_addr, "0.0.0.0:8082");
        assert_eq!(config.database_url, None);
        assert_eq!(config.settings, BridgeSettings::default());
        assert!(config.settings.http_only);
        assert_eq!(config.settings.same_site, SameSite::Lax);
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("COOKIE_NAME", "sso_token"),
            ("COOKIE_DURATION_SECS", "7200"),
            ("COOKIE_SAMESITE", "strict"),
            ("COOKIE_HTTP_ONLY", "false"),
            ("COOKIE_DOMAIN", ".courses.example.edu"),
            ("ALLOWED_DOMAINS", "example.edu, example.org ,"),
            ("DEBUG_MODE", "1"),
            ("JWT_VERIFY_SECRET", "s3cret"),
        ])
        .unwrap();
        let s = config.settings;
        assert_eq!(s.cookie_name, "sso_token");
        assert_eq!(s.cookie_duration_secs, 7200);
        assert_eq!(s.same_site, SameSite::Strict);
        assert!(!s.http_only);
        assert_eq!(s.cookie_domain, "courses.example.edu");
        assert_eq!(s.allowed_domains, vec!["example.edu", "example.org"]);
        assert!(s.debug_mode);
        assert_eq!(s.verify_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn unknown_samesite_falls_back_to_lax() {
        let config = load(&[("COOKIE_SAMESITE", "Sometimes")]).unwrap();
        assert_eq!(config.settings.same_site, SameSite::Lax);
    }

    #[test]
    fn cookie_domain_falls_back_to_site_url_host() {
        let config = load(&[("SITE_URL", "https://online.example.edu/wp")]).unwrap();
        assert_eq!(config.settings.cookie_domain, "online.example.edu");
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(load(&[("COOKIE_DURATION_SECS", "-5")]).is_err());
        assert!(load(&[("COOKIE_HTTP_ONLY", "maybe")]).is_err());
        assert!(load(&[("COOKIE_NAME", "bad name")]).is_err());
        assert!(load(&[("SITE_URL", "not a url")]).is_err());
    }
}
