use crate::utils::error::{GatePassError, Result};
use crate::utils::validation::{validate_one_of, validate_path, validate_positive_number, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
    /// SQLite 等待寫入鎖的上限
    pub busy_timeout_ms: u64,
    /// 等待連線池釋出連線的上限
    pub connection_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "gatepass.db".to_string(),
            pool_size: 8,
            busy_timeout_ms: 5_000,
            connection_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// `:memory:` 會讓連線池中每條連線各自擁有一個私有資料庫
    pub fn is_in_memory(&self) -> bool {
        let path = self.path.trim();
        path == ":memory:" || path.contains("mode=memory") || path.starts_with("file::memory:")
    }

    pub fn validate_path(&self) -> Result<()> {
        validate_path("database.path", &self.path)?;
        if self.is_in_memory() {
            return Err(GatePassError::ConfigError {
                field: "database.path".to_string(),
                message: "in-memory databases are not shared across pooled connections; use a file path"
                    .to_string(),
            });
        }
        Ok(())
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GatePassError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GATEPASS_DB})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GatePassError::ConfigError {
            field: "toml_parsing".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        self.database.validate_path()?;
        validate_positive_number("database.pool_size", u64::from(self.database.pool_size), 1)?;
        validate_positive_number("database.busy_timeout_ms", self.database.busy_timeout_ms, 1)?;
        validate_positive_number(
            "database.connection_timeout_ms",
            self.database.connection_timeout_ms,
            1,
        )?;
        validate_one_of("logging.level", &self.logging.level, &LOG_LEVELS)?;
        Ok(())
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
