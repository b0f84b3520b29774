use anyhow::{Context, Result};

/// Connection settings for the repair tool.
///
/// | Env Var                    | Default  |
/// |----------------------------|----------|
/// | `DATABASE_URL`             | required |
/// | `DATABASE_MAX_CONNECTIONS` | `20`     |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl RepairConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse::<u32>().with_context(|| {
                format!("DATABASE_MAX_CONNECTIONS must be a positive integer, got '{raw}'")
            })?,
            None => casting_db::DEFAULT_MAX_CONNECTIONS,
        };
        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_pool_size() {
        let config =
            RepairConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://db/casting")]))
                .unwrap();
        assert_eq!(config.database_url, "postgres://db/casting");
        assert_eq!(config.max_connections, casting_db::DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = RepairConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn bad_pool_size_is_an_error() {
        let err = RepairConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/casting"),
            ("DATABASE_MAX_CONNECTIONS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("lots"));
    }
}
