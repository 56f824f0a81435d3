use super::error::ConfigError;
use super::models::app_env::{AppEnv, Env};
use std::env;
use std::str::FromStr;

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_CONFIG_DIR: &str = "config";

impl AppEnv {
    pub fn new() -> Result<AppEnv, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the environment from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<AppEnv, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::MissingVar(name));

        // Store variables first so a misconfigured deployment reports the store
        let clickhouse_url = required("CLICKHOUSE_HOST")?;
        let clickhouse_user = required("CLICKHOUSE_USER")?;
        let clickhouse_password = required("CLICKHOUSE_PASSWORD")?;
        let clickhouse_database = required("CLICKHOUSE_DATABASE")?;

        let env = match optional("ENV") {
            Some(value) => Env::from_str(&value)
                .map_err(|_| ConfigError::InvalidVar { name: "ENV", value })?,
            None => Env::Local,
        };

        let server_port = match optional("SERVER_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name: "SERVER_PORT",
                value,
            })?,
            None => DEFAULT_SERVER_PORT,
        };

        Ok(AppEnv {
            env,
            server_address: optional("SERVER_ADDRESS")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            server_port,
            config_dir: optional("APP_CONFIG_DIR").unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string()),
            clickhouse_url,
            clickhouse_user,
            clickhouse_password,
            clickhouse_database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const STORE_VARS: [(&str, &str); 4] = [
        ("CLICKHOUSE_HOST", "http://localhost:8123"),
        ("CLICKHOUSE_USER", "default"),
        ("CLICKHOUSE_PASSWORD", "secret"),
        ("CLICKHOUSE_DATABASE", "market_data"),
    ];

    #[test]
    fn test_defaults_applied_when_optional_vars_missing() {
        let env = AppEnv::from_lookup(lookup_from(&STORE_VARS)).unwrap();

        assert_eq!(env.env, Env::Local);
        assert_eq!(env.server_address, "0.0.0.0");
        assert_eq!(env.server_port, 8000);
        assert_eq!(env.config_dir, "config");
        assert_eq!(env.clickhouse_database, "market_data");
    }

    #[test]
    fn test_each_store_var_is_required() {
        for (missing, _) in STORE_VARS {
            let pairs: Vec<(&str, &str)> = STORE_VARS
                .iter()
                .copied()
                .filter(|(name, _)| *name != missing)
                .collect();

            let err = AppEnv::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(matches!(err, ConfigError::MissingVar(name) if name == missing));
        }
    }

    #[test]
    fn test_blank_store_var_counts_as_missing() {
        let mut pairs = STORE_VARS.to_vec();
        pairs[3] = ("CLICKHOUSE_DATABASE", "  ");

        let err = AppEnv::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("CLICKHOUSE_DATABASE")));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut pairs = STORE_VARS.to_vec();
        pairs.push(("SERVER_PORT", "eighty"));

        let err = AppEnv::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "SERVER_PORT", .. }));
    }

    #[test]
    fn test_prod_environment() {
        let mut pairs = STORE_VARS.to_vec();
        pairs.push(("ENV", "PROD"));

        let env = AppEnv::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(!env.is_local());
        assert_eq!(env.env.to_string(), "prod");
    }
}
