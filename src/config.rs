//! Environment-driven configuration.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP server binds on.
    pub port: u16,
    /// Path to the libSQL database file.
    pub db_path: String,
    /// Raw `token:userId` pairs, comma separated. Parsed by the verifier.
    pub api_tokens: SecretString,
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// `FUNDBRIDGE_API_TOKENS` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = std::env::var("FUNDBRIDGE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let db_path = std::env::var("FUNDBRIDGE_DB_PATH")
            .unwrap_or_else(|_| "./data/fundbridge.db".to_string());

        let api_tokens =
            std::env::var("FUNDBRIDGE_API_TOKENS").map_err(|_| ConfigError::MissingRequired {
                key: "FUNDBRIDGE_API_TOKENS".to_string(),
                hint: "Set comma-separated token:userId pairs, e.g. \
                       FUNDBRIDGE_API_TOKENS=tok123:user_2abc"
                    .to_string(),
            })?;

        Ok(Self {
            port,
            db_path,
            api_tokens: SecretString::from(api_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_requires_tokens() {
        // SAFETY: test-local; no other thread reads these vars concurrently.
        unsafe { std::env::remove_var("FUNDBRIDGE_API_TOKENS") };
        let err = ServerConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "FUNDBRIDGE_API_TOKENS"));
    }
}
