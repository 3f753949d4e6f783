// src/config.rs

use std::{
    env, fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    path::PathBuf,
};

use dotenvy::dotenv;

/// Smallest number of options any question may carry.
pub const MIN_OPTIONS_FLOOR: usize = 2;

/// Admin routes are mounted here; the access gate always guards it.
pub const ADMIN_PREFIX: &str = "/api/admin";

/// Default upload ceiling for question images (4 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Access gate configuration, passed into the gate at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatePolicy {
    /// Every admin request proceeds.
    Disabled,
    /// Only requests whose resolved client IP is listed proceed.
    AllowList(Vec<IpAddr>),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the service on the in-memory question store.
    pub database_url: Option<String>,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub gate_policy: GatePolicy,
    /// Peers whose forwarding headers are believed. `None` believes any peer.
    pub trusted_proxies: Option<Vec<IpAddr>>,
    pub admin_path_prefixes: Vec<String>,
    pub min_options: usize,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub public_base_url: String,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            rust_log: "info".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            gate_policy: GatePolicy::AllowList(vec![
                IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(Ipv6Addr::LOCALHOST),
            ]),
            trusted_proxies: None,
            admin_path_prefixes: vec![ADMIN_PREFIX.to_string()],
            min_options: MIN_OPTIONS_FLOOR,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            public_base_url: "http://localhost:3000".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    /// Unset keys fall back to `Config::default()`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL");

        let rust_log = get("RUST_LOG").unwrap_or(defaults.rust_log);

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.trim().parse::<SocketAddr>().map_err(|e| ConfigError {
                key: "BIND_ADDR",
                message: format!("{}", e),
            })?,
            None => defaults.bind_addr,
        };

        let gate_disabled = match get("ADMIN_GATE_DISABLED") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError {
                key: "ADMIN_GATE_DISABLED",
                message: format!("expected true/false, got '{}'", raw),
            })?,
            None => false,
        };

        let gate_policy = if gate_disabled {
            GatePolicy::Disabled
        } else {
            match get("ADMIN_ALLOWED_IPS") {
                Some(raw) => GatePolicy::AllowList(parse_ip_list("ADMIN_ALLOWED_IPS", &raw)?),
                None => defaults.gate_policy,
            }
        };

        let trusted_proxies = match get("TRUSTED_PROXIES") {
            Some(raw) => Some(parse_ip_list("TRUSTED_PROXIES", &raw)?),
            None => defaults.trusted_proxies,
        };

        // Extra prefixes are added to the admin prefix, never replace it.
        let mut admin_path_prefixes = get("ADMIN_PATH_PREFIXES")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.admin_path_prefixes);
        if !admin_path_prefixes.iter().any(|p| p == ADMIN_PREFIX) {
            admin_path_prefixes.insert(0, ADMIN_PREFIX.to_string());
        }

        // Never allow fewer than two options, whatever the operator asks for.
        let min_options = match get("MIN_OPTIONS") {
            Some(raw) => parse_usize("MIN_OPTIONS", &raw)?.max(MIN_OPTIONS_FLOOR),
            None => defaults.min_options,
        };

        let upload_dir = get("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => parse_usize("MAX_UPLOAD_BYTES", &raw)?,
            None => defaults.max_upload_bytes,
        };

        let public_base_url = get("PUBLIC_BASE_URL")
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.public_base_url);
        url::Url::parse(&public_base_url).map_err(|e| ConfigError {
            key: "PUBLIC_BASE_URL",
            message: e.to_string(),
        })?;

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            database_url,
            rust_log,
            bind_addr,
            gate_policy,
            trusted_proxies,
            admin_path_prefixes,
            min_options,
            upload_dir,
            max_upload_bytes,
            public_base_url,
            cors_origins,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_ip_list(key: &'static str, raw: &str) -> Result<Vec<IpAddr>, ConfigError> {
    split_list(raw)
        .iter()
        .map(|ip| {
            ip.parse::<IpAddr>().map_err(|e| ConfigError {
                key,
                message: format!("'{}': {}", ip, e),
            })
        })
        .collect()
}

fn parse_usize(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError {
        key,
        message: format!("'{}': {}", raw, e),
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_keep_the_gate_on_for_loopback() {
        let config = config_from(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.min_options, 2);
        assert_eq!(config.max_upload_bytes, 4 * 1024 * 1024);
        match config.gate_policy {
            GatePolicy::AllowList(ips) => {
                assert!(ips.contains(&"127.0.0.1".parse().unwrap()));
            }
            GatePolicy::Disabled => panic!("gate must be enabled by default"),
        }
    }

    #[test]
    fn parses_allow_list_and_explicit_disable() {
        let config = config_from(&[("ADMIN_ALLOWED_IPS", "10.0.0.1, 192.168.1.7")]).unwrap();
        assert_eq!(
            config.gate_policy,
            GatePolicy::AllowList(vec![
                "10.0.0.1".parse().unwrap(),
                "192.168.1.7".parse().unwrap()
            ])
        );

        let config = config_from(&[
            ("ADMIN_ALLOWED_IPS", "10.0.0.1"),
            ("ADMIN_GATE_DISABLED", "true"),
        ])
        .unwrap();
        assert_eq!(config.gate_policy, GatePolicy::Disabled);
    }

    #[test]
    fn trusted_proxies_are_optional() {
        assert_eq!(config_from(&[]).unwrap().trusted_proxies, None);

        let config = config_from(&[("TRUSTED_PROXIES", "10.0.0.2")]).unwrap();
        assert_eq!(config.trusted_proxies, Some(vec!["10.0.0.2".parse().unwrap()]));

        let err = config_from(&[("TRUSTED_PROXIES", "proxy")]).unwrap_err();
        assert_eq!(err.key, "TRUSTED_PROXIES");
    }

    #[test]
    fn min_options_never_drops_below_two() {
        let config = config_from(&[("MIN_OPTIONS", "1")]).unwrap();
        assert_eq!(config.min_options, 2);

        let config = config_from(&[("MIN_OPTIONS", "4")]).unwrap();
        assert_eq!(config.min_options, 4);
    }

    #[test]
    fn admin_prefix_is_always_guarded() {
        let config = config_from(&[("ADMIN_PATH_PREFIXES", "/internal")]).unwrap();
        assert_eq!(config.admin_path_prefixes, vec!["/api/admin", "/internal"]);
    }

    #[test]
    fn rejects_bad_values() {
        let err = config_from(&[("ADMIN_ALLOWED_IPS", "not-an-ip")]).unwrap_err();
        assert_eq!(err.key, "ADMIN_ALLOWED_IPS");

        let err = config_from(&[("ADMIN_GATE_DISABLED", "maybe")]).unwrap_err();
        assert_eq!(err.key, "ADMIN_GATE_DISABLED");

        let err = config_from(&[("PUBLIC_BASE_URL", "no scheme here")]).unwrap_err();
        assert_eq!(err.key, "PUBLIC_BASE_URL");
    }
}
