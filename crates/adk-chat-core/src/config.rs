//! Environment-sourced configuration

use tracing::warn;

/// Default engine resource name offered to front ends.
pub const ENGINE_ENV: &str = "REASONING_ENGINE";

/// Listen port for the HTTP server variant.
pub const PORT_ENV: &str = "PORT";

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Default engine resource name; may be empty when unset.
    pub default_engine: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let default_engine = std::env::var(ENGINE_ENV).unwrap_or_default();

        let port = match std::env::var(PORT_ENV) {
            Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse() {
                Ok(port) => port,
                Err(_) => {
                    warn!("Invalid {} value '{}', using {}", PORT_ENV, raw, DEFAULT_PORT);
                    DEFAULT_PORT
                }
            },
            _ => DEFAULT_PORT,
        };

        Self {
            default_engine,
            port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test covers all env states: the variables are process-global.
    #[test]
    fn test_from_env() {
        std::env::remove_var(ENGINE_ENV);
        std::env::remove_var(PORT_ENV);
        let config = Config::from_env();
        assert_eq!(config.default_engine, "");
        assert_eq!(config.port, DEFAULT_PORT);

        std::env::set_var(ENGINE_ENV, "projects/p/locations/l/reasoningEngines/e");
        std::env::set_var(PORT_ENV, "9090");
        let config = Config::from_env();
        assert_eq!(config.default_engine, "projects/p/locations/l/reasoningEngines/e");
        assert_eq!(config.port, 9090);

        std::env::set_var(PORT_ENV, "not-a-port");
        assert_eq!(Config::from_env().port, DEFAULT_PORT);

        std::env::remove_var(ENGINE_ENV);
        std::env::remove_var(PORT_ENV);
    }
}
