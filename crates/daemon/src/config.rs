// Daemon configuration (environment variables)

use crate::app::ServiceSettings;
use anyhow::{anyhow, Context, Result};
use qnd_api_rpc::RpcServerConfig;
use qnd_core::application::constants::DEFAULT_TOKEN_TTL_SECS;
use qnd_core::application::DeletePolicy;
use rand::Rng;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "~/.qnd/qnd.db";
const DEFAULT_RESTART_DELAY_MS: u64 = 1000;
const DEFAULT_BCRYPT_COST: u32 = 12;
const BCRYPT_COSTS: std::ops::RangeInclusive<u32> = 4..=31;
const GENERATED_KEY_LEN: usize = 32;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub rpc: RpcServerConfig,
    pub service: ServiceSettings,
    pub restart_delay: Duration,
    pub log_format: LogFormat,
    /// True when no QND_SECRET_KEY was given and a random one was generated
    pub generated_secret: bool,
}

impl DaemonConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup` (environment-shaped key/value source)
    ///
    /// # Errors
    /// Returns an error naming the variable when a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RpcServerConfig::default();

        let db_path = lookup("QND_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let db_path = shellexpand::tilde(&db_path).into_owned();

        let rpc = RpcServerConfig {
            host: lookup("QND_HOST").unwrap_or(defaults.host),
            data_port: parse_or(&lookup, "QND_DATA_PORT", defaults.data_port)?,
            management_port: parse_or(&lookup, "QND_MANAGEMENT_PORT", defaults.management_port)?,
        };

        let (secret_key, generated_secret) = match lookup("QND_SECRET_KEY") {
            Some(key) if !key.is_empty() => (key.into_bytes(), false),
            _ => {
                let mut key = vec![0u8; GENERATED_KEY_LEN];
                rand::thread_rng().fill(&mut key[..]);
                (key, true)
            }
        };

        let token_ttl_secs: i64 = parse_or(&lookup, "QND_TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        if token_ttl_secs <= 0 {
            return Err(anyhow!("QND_TOKEN_TTL_SECS must be positive"));
        }

        let bcrypt_cost: u32 = parse_or(&lookup, "QND_BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !BCRYPT_COSTS.contains(&bcrypt_cost) {
            return Err(anyhow!(
                "QND_BCRYPT_COST must be between {} and {}",
                BCRYPT_COSTS.start(),
                BCRYPT_COSTS.end()
            ));
        }

        let delete_policy = match lookup("QND_DELETE_POLICY") {
            Some(raw) => raw
                .parse::<DeletePolicy>()
                .map_err(|e| anyhow!("QND_DELETE_POLICY: {}", e))?,
            None => DeletePolicy::default(),
        };

        let restart_delay = Duration::from_millis(parse_or(
            &lookup,
            "QND_RESTART_DELAY_MS",
            DEFAULT_RESTART_DELAY_MS,
        )?);

        let log_format = match lookup("QND_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            db_path,
            rpc,
            service: ServiceSettings {
                secret_key,
                token_ttl_secs,
                delete_policy,
                bcrypt_cost,
            },
            restart_delay,
            log_format,
            generated_secret,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<DaemonConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]).unwrap();

        assert!(c.db_path.ends_with(".qnd/qnd.db"));
        assert!(!c.db_path.starts_with('~'));
        assert_eq!(c.rpc.host, "0.0.0.0");
        assert_eq!(c.rpc.data_port, 8080);
        assert_eq!(c.rpc.management_port, 8888);
        assert_eq!(c.service.token_ttl_secs, 600);
        assert_eq!(c.service.delete_policy, DeletePolicy::Retain);
        assert_eq!(c.restart_delay, Duration::from_millis(1000));
        assert_eq!(c.log_format, LogFormat::Pretty);
        assert!(c.generated_secret);
        assert_eq!(c.service.secret_key.len(), GENERATED_KEY_LEN);
    }

    #[test]
    fn test_overrides() {
        let c = config(&[
            ("QND_DB_PATH", "/tmp/q.db"),
            ("QND_DATA_PORT", "9000"),
            ("QND_MANAGEMENT_PORT", "9001"),
            ("QND_SECRET_KEY", "s3cret"),
            ("QND_TOKEN_TTL_SECS", "60"),
            ("QND_DELETE_POLICY", "cascade"),
            ("QND_LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(c.db_path, "/tmp/q.db");
        assert_eq!(c.rpc.data_port, 9000);
        assert_eq!(c.rpc.management_port, 9001);
        assert_eq!(c.service.secret_key, b"s3cret".to_vec());
        assert!(!c.generated_secret);
        assert_eq!(c.service.token_ttl_secs, 60);
        assert_eq!(c.service.delete_policy, DeletePolicy::Cascade);
        assert_eq!(c.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[("QND_DATA_PORT", "eighty")]).is_err());
        assert!(config(&[("QND_DELETE_POLICY", "purge")]).is_err());
        assert!(config(&[("QND_TOKEN_TTL_SECS", "0")]).is_err());
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        assert_eq!(config(&[]).unwrap().service.bcrypt_cost, 12);
        assert_eq!(config(&[("QND_BCRYPT_COST", "4")]).unwrap().service.bcrypt_cost, 4);
        assert_eq!(config(&[("QND_BCRYPT_COST", "31")]).unwrap().service.bcrypt_cost, 31);

        let err = config(&[("QND_BCRYPT_COST", "3")]).unwrap_err();
        assert!(err.to_string().contains("QND_BCRYPT_COST"));
        assert!(config(&[("QND_BCRYPT_COST", "32")]).is_err());
        assert!(config(&[("QND_BCRYPT_COST", "-1")]).is_err());
    }

    #[test]
    fn test_generated_secrets_differ() {
        let a = config(&[]).unwrap();
        let b = config(&[]).unwrap();
        assert_ne!(a.service.secret_key, b.service.secret_key);
    }
}
