use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 上游取得的原始情境資料，取得後不可變更，可在快取與請求之間共享
pub type RawDocument = Arc<Value>;

/// 一筆扁平化紀錄：欄位名稱 -> 純量值，保留映射定義中的欄位順序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// 映射引擎的輸出：依定義順序排列的資料表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntermediateRepresentation {
    pub tables: Vec<Table>,
}

impl IntermediateRepresentation {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn record_count(&self) -> usize {
        self.tables.iter().map(|t| t.records.len()).sum()
    }

    /// 轉成 `{ "<table>": [ {...}, ... ] }` 形式的 JSON
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for table in &self.tables {
            let rows = table
                .records
                .iter()
                .map(|r| Value::Object(r.data.clone()))
                .collect();
            root.insert(table.name.clone(), Value::Array(rows));
        }
        Value::Object(root)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "zip",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("Unsupported output format '{}'. Valid formats: json, csv", other)),
        }
    }
}

/// 序列化結果，交給 HTTP 層或 CLI 寫出
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedResult {
    Json { body: Value },
    Zip { body: Vec<u8>, filename: String },
}

impl SerializedResult {
    pub fn content_type(&self) -> &'static str {
        match self {
            SerializedResult::Json { .. } => "application/json",
            SerializedResult::Zip { .. } => "application/zip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScenarioIdentifier {
    ById(i64),
    ByName(String),
}

impl fmt::Display for ScenarioIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioIdentifier::ById(id) => write!(f, "id={}", id),
            ScenarioIdentifier::ByName(name) => write!(f, "name={}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScenarioRequest {
    pub source: String,
    pub identifier: ScenarioIdentifier,
}

impl ScenarioRequest {
    pub fn by_id(source: impl Into<String>, id: i64) -> Self {
        Self {
            source: source.into(),
            identifier: ScenarioIdentifier::ById(id),
        }
    }

    pub fn by_name(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            identifier: ScenarioIdentifier::ByName(name.into()),
        }
    }

    /// 快取鍵：只去掉前後空白，來源名稱區分大小寫（與來源查找規則一致）
    pub fn normalized(&self) -> Self {
        let identifier = match &self.identifier {
            ScenarioIdentifier::ById(id) => ScenarioIdentifier::ById(*id),
            ScenarioIdentifier::ByName(name) => ScenarioIdentifier::ByName(name.trim().to_string()),
        };
        Self {
            source: self.source.trim().to_string(),
            identifier,
        }
    }
}
