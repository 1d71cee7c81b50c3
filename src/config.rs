use crate::error::{RelayError, Result};
use serde::Deserialize;
use std::env;
use std::fs;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub anthropic: AnthropicConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl RelayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let listen_addr =
            env::var("RELAY_LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| RelayError::Config("ANTHROPIC_API_KEY not set".to_string()))?;

        let endpoint = env::var("ANTHROPIC_ENDPOINT").unwrap_or_else(|_| default_endpoint());

        let model = env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| default_model());

        let max_tokens = env::var("ANTHROPIC_MAX_TOKENS")
            .unwrap_or_else(|_| DEFAULT_MAX_TOKENS.to_string())
            .parse::<u32>()
            .map_err(|e| RelayError::Config(format!("Invalid max_tokens value: {}", e)))?;

        Ok(RelayConfig {
            server: ServerConfig { listen_addr },
            anthropic: AnthropicConfig {
                api_key,
                endpoint,
                model,
                max_tokens,
            },
        })
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: RelayConfig = toml::from_str(&contents)
            .map_err(|e| RelayError::Config(format!("Failed to parse config file: {}", e)))?;

        // Allow environment variables to override file config
        if let Ok(api_key) = env::var("ANTHROPIC_API_KEY") {
            config.anthropic.api_key = api_key;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.anthropic.api_key.is_empty() {
            return Err(RelayError::Config("API key is empty".to_string()));
        }

        if self.anthropic.endpoint.is_empty() {
            return Err(RelayError::Config("Endpoint is empty".to_string()));
        }

        if self.anthropic.max_tokens == 0 {
            return Err(RelayError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.server.listen_addr.is_empty() {
            return Err(RelayError::Config("Listen address is empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> RelayConfig {
        RelayConfig {
            server: ServerConfig {
                listen_addr: "127.0.0.1:8000".to_string(),
            },
            anthropic: AnthropicConfig {
                api_key: "test-key".to_string(),
                endpoint: default_endpoint(),
                model: default_model(),
                max_tokens: 1024,
            },
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(base_config().validate().is_ok());

        let mut missing_key = base_config();
        missing_key.anthropic.api_key.clear();
        assert!(missing_key.validate().is_err());

        let mut zero_tokens = base_config();
        zero_tokens.anthropic.max_tokens = 0;
        assert!(zero_tokens.validate().is_err());
    }

    #[test]
    fn test_toml_defaults_applied() {
        let config: RelayConfig = toml::from_str(
            r#"
            [server]
            listen_addr = "0.0.0.0:8000"

            [anthropic]
            api_key = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.anthropic.endpoint, default_endpoint());
        assert_eq!(config.anthropic.model, DEFAULT_MODEL);
        assert_eq!(config.anthropic.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
