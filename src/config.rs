use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub parser: ParserConfig,
    pub case_db: CaseDbConfig,
    pub logging: LoggingConfig,
    pub export: ExportConfig,
}

/// Identity of the parser and the database names it looks for
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub package_name: String,
    pub parser_name: String,
    pub version: String,
    pub account_type: String,
    pub message_type_label: String,
    pub message_db_pattern: String,
    pub contact_db_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseDbConfig {
    pub path: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub default_format: String,
    pub output_directory: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            package_name: "com.zhiliaoapp.musically".to_string(),
            parser_name: "Tiktok Parser".to_string(),
            version: "15.0.1".to_string(),
            account_type: "Tiktok".to_string(),
            message_type_label: "Tiktok Message".to_string(),
            message_db_pattern: "%_im.db".to_string(),
            contact_db_name: "db_im_xx".to_string(),
        }
    }
}

impl Default for CaseDbConfig {
    fn default() -> Self {
        Self {
            path: "case/artifacts.db".to_string(),
            pool_size: 4,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file_path: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "csv".to_string(),
            output_directory: "./output".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {}", e))?;

        let config = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("TIKTOK_EXTRACT").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let parser = &self.parser;
        for (field, value) in [
            ("package_name", &parser.package_name),
            ("parser_name", &parser.parser_name),
            ("account_type", &parser.account_type),
            ("message_db_pattern", &parser.message_db_pattern),
            ("contact_db_name", &parser.contact_db_name),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("parser.{} must not be empty", field));
            }
        }

        if self.case_db.pool_size == 0 {
            return Err(anyhow::anyhow!("pool_size must be greater than 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_log_formats = ["text", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_log_formats
            ));
        }

        let valid_formats = ["csv", "json"];
        if !valid_formats.contains(&self.export.default_format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid export format: {}. Must be one of: {:?}",
                self.export.default_format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Get case database path from environment or config
    pub fn get_case_db_path(&self) -> String {
        std::env::var("CASE_DB_PATH").unwrap_or_else(|_| self.case_db.path.clone())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
