use crate::core::format::DEFAULT_ARCHIVE_FILENAME;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub mappings: MappingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_archive_filename")]
    pub archive_filename: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
}

/// 一個 OEP 資料表來源：`GET <endpoint>?where=<field>=<value>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_name_field")]
    pub name_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingsConfig {
    /// 自訂映射目錄；未設定時只使用內建映射
    pub directory: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_archive_filename() -> String {
    DEFAULT_ARCHIVE_FILENAME.to_string()
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_name_field() -> String {
    "scenario".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    128
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            archive_filename: default_archive_filename(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            capacity: default_cache_capacity(),
            ttl_seconds: None,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OEP_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("server.bind", &self.server.bind)?;
        validation::validate_positive_number("server.port", self.server.port as usize, 1)?;
        validation::validate_archive_filename("server.archive_filename", &self.server.archive_filename)?;

        if let Some(timeout) = self.upstream.timeout_seconds {
            validation::validate_positive_number("upstream.timeout_seconds", timeout as usize, 1)?;
        }

        for (name, source) in &self.upstream.sources {
            validation::validate_non_empty_string("upstream.sources", name)?;
            validation::validate_url(&format!("upstream.sources.{}.endpoint", name), &source.endpoint)?;
            validation::validate_non_empty_string(
                &format!("upstream.sources.{}.id_field", name),
                &source.id_field,
            )?;
            validation::validate_non_empty_string(
                &format!("upstream.sources.{}.name_field", name),
                &source.name_field,
            )?;
        }

        if self.cache.enabled {
            validation::validate_positive_number("cache.capacity", self.cache.capacity, 1)?;
        }

        if let Some(dir) = &self.mappings.directory {
            validation::validate_path("mappings.directory", dir)?;
        }

        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.upstream.sources.get(name.trim())
    }

    pub fn source_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.upstream.sources.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
