use rdsdata_api::MappingOptions;
use serde::Deserialize;

use crate::error::ClientError;

/// Client configuration, usually read from TOML:
///
/// ```toml
/// resource_arn = "arn:aws:rds:eu-west-1:123456789012:cluster:orders"
/// secret_arn = "arn:aws:secretsmanager:eu-west-1:123456789012:secret:orders"
/// database = "orders"
///
/// [mapping]
/// use_label_for_mapping = true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub database: Option<String>,
    pub resource_arn: String,
    pub secret_arn: String,
    #[serde(default)]
    pub mapping: MappingOptions,
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ClientError> {
        toml::from_str(toml_str).map_err(|e| ClientError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = ClientConfig::parse(
            r#"
            resource_arn = "arn:cluster"
            secret_arn = "arn:secret"
            database = "orders"

            [mapping]
            use_label_for_mapping = true
            "#,
        )
        .unwrap();
        assert_eq!(config.database.as_deref(), Some("orders"));
        assert!(config.mapping.use_label_for_mapping);
        assert!(!config.mapping.ignore_missing_setters);
    }

    #[test]
    fn mapping_section_is_optional() {
        let config = ClientConfig::parse("resource_arn = \"r\"\nsecret_arn = \"s\"").unwrap();
        assert_eq!(config.mapping, MappingOptions::DEFAULT);
        assert_eq!(config.database, None);
    }

    #[test]
    fn missing_arn_is_a_config_error() {
        let err = ClientConfig::parse("secret_arn = \"s\"").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let err = ClientConfig::load("/nonexistent/rdsdata.toml").unwrap_err();
        match err {
            ClientError::Config(msg) => assert!(msg.starts_with("/nonexistent/rdsdata.toml: ")),
            other => panic!("expected Config, got {other:?}"),
        }
    }
}
