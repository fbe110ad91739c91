use thiserror::Error;

/// 映射定義相關錯誤（未知映射名稱、路徑語法錯誤、定義衝突）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Unknown mapping '{name}'. Available mappings: {available}")]
    UnknownMapping { name: String, available: String },

    #[error("Malformed path expression '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Invalid mapping definition '{mapping}': {reason}")]
    InvalidDefinition { mapping: String, reason: String },

    #[error("Duplicate mapping name '{name}'")]
    DuplicateMapping { name: String },
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Upstream data source unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Scenario {identifier} not found in source '{source_name}'")]
    ScenarioNotFound {
        source_name: String,
        identifier: String,
    },

    #[error("Unknown scenario source '{name}'")]
    UnknownSource { name: String },

    #[error("Mapping error: {0}")]
    MappingApplication(#[from] MappingError),

    #[error(
        "Table '{table}' column '{column}' (row {row}) holds a nested {kind} value that cannot be written as CSV"
    )]
    UnsupportedMappingForFormat {
        table: String,
        column: String,
        row: usize,
        kind: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Upstream,
    Mapping,
    Format,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::UpstreamUnavailable { .. }
            | EtlError::ScenarioNotFound { .. }
            | EtlError::UnknownSource { .. } => ErrorCategory::Upstream,
            EtlError::MappingApplication(_) => ErrorCategory::Mapping,
            EtlError::UnsupportedMappingForFormat { .. }
            | EtlError::CsvError(_)
            | EtlError::ZipError(_)
            | EtlError::SerializationError(_) => ErrorCategory::Format,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 上游暫時不可用，稍後重試即可
            EtlError::UpstreamUnavailable { .. } => ErrorSeverity::Medium,
            EtlError::ScenarioNotFound { .. }
            | EtlError::UnknownSource { .. }
            | EtlError::MappingApplication(_)
            | EtlError::UnsupportedMappingForFormat { .. } => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
            EtlError::CsvError(_)
            | EtlError::ZipError(_)
            | EtlError::SerializationError(_)
            | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的錯誤訊息（不含內部細節）
    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::UpstreamUnavailable { .. } => {
                "Could not reach the open data platform. Please try again later.".to_string()
            }
            EtlError::ScenarioNotFound {
                source_name,
                identifier,
            } => format!(
                "No scenario {} exists in source '{}'.",
                identifier, source_name
            ),
            EtlError::UnknownSource { name } => {
                format!("'{}' is not a configured scenario source.", name)
            }
            EtlError::MappingApplication(inner) => inner.to_string(),
            EtlError::UnsupportedMappingForFormat { .. } => format!(
                "Error while creating zip file from result json: {}. Maybe the mapping is not supported for the chosen output format?",
                self
            ),
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => format!("Invalid configuration: {}", self),
            _ => format!("Internal error while preparing the response: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Upstream => match self {
                EtlError::UpstreamUnavailable { .. } => {
                    "Check network connectivity and the upstream endpoint, then retry"
                }
                EtlError::UnknownSource { .. } => {
                    "Use one of the sources listed under [upstream.sources] in the config file"
                }
                _ => "Verify the scenario id or name exists on the platform",
            },
            ErrorCategory::Mapping => {
                "Pick a mapping listed by the `mappings` command or fix the mapping definition"
            }
            ErrorCategory::Format => "Request JSON output or use a mapping that yields flat columns",
            ErrorCategory::Configuration => "Review the configuration file and environment variables",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

impl From<reqwest::Error> for EtlError {
    fn from(err: reqwest::Error) -> Self {
        EtlError::UpstreamUnavailable {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
