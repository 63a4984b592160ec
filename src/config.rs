use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "EDUGUARD_LOG";
const DEFAULT_LOG_FILTER: &str = "eduguard=info";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .context("DATABASE_URL must be set to a production Postgres instance")?;
        let max_connections = match lookup("EDUGUARD_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("EDUGUARD_MAX_CONNECTIONS is not a number: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

/// Logs go to stderr so command output on stdout stays pipeable.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn database_url_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn max_connections_defaults_to_five() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/edu")]))
            .unwrap();
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn max_connections_must_be_numeric() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/edu"),
            ("EDUGUARD_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 12);

        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/edu"),
            ("EDUGUARD_MAX_CONNECTIONS", "many"),
        ]))
        .is_err());
    }
}
