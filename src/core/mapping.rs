use crate::core::path::PathExpr;
use crate::domain::model::{IntermediateRepresentation, Record, Table};
use crate::utils::error::MappingError;
use crate::utils::validation::has_unsafe_name_chars;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// TOML 中的映射定義（未編譯）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingDefinition {
    pub name: String,
    pub description: Option<String>,
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub rows: String,
    pub columns: Vec<ColumnDefinition>,
}

/// 欄位可以只寫名稱（名稱即相對路徑），或完整寫出 `{ name, path }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnDefinition {
    Name(String),
    Full { name: String, path: String },
}

impl ColumnDefinition {
    pub fn name(&self) -> &str {
        match self {
            ColumnDefinition::Name(name) => name,
            ColumnDefinition::Full { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ColumnDefinition::Name(name) => name,
            ColumnDefinition::Full { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledColumn {
    pub name: String,
    pub path: PathExpr,
}

#[derive(Debug, Clone)]
pub struct CompiledTable {
    pub name: String,
    pub rows: PathExpr,
    pub columns: Vec<CompiledColumn>,
}

impl CompiledTable {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// 已驗證並解析好路徑的映射，可重複套用
#[derive(Debug, Clone)]
pub struct CompiledMapping {
    pub name: String,
    pub description: Option<String>,
    pub tables: Vec<CompiledTable>,
}

impl MappingDefinition {
    /// 從 TOML 字串解析映射定義
    pub fn from_toml_str(content: &str) -> Result<Self, MappingError> {
        toml::from_str(content).map_err(|e| MappingError::InvalidDefinition {
            mapping: "<toml>".to_string(),
            reason: e.to_string(),
        })
    }

    /// 編譯並驗證：路徑語法、表格與欄位名稱不可重複
    pub fn compile(&self) -> Result<CompiledMapping, MappingError> {
        let invalid = |reason: String| MappingError::InvalidDefinition {
            mapping: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("mapping name cannot be empty".to_string()));
        }
        if self.tables.is_empty() {
            return Err(invalid("mapping must define at least one table".to_string()));
        }

        let mut table_names = HashSet::new();
        let mut tables = Vec::with_capacity(self.tables.len());

        for table in &self.tables {
            if table.name.trim().is_empty() {
                return Err(invalid("table name cannot be empty".to_string()));
            }
            // 表名會成為壓縮檔內的 `<table>.csv` 項目名稱
            if has_unsafe_name_chars(&table.name) || table.name.contains("..") {
                return Err(invalid(format!(
                    "table name '{}' must not contain path separators, quotes, control characters or '..'",
                    table.name
                )));
            }
            if table.columns.is_empty() {
                return Err(invalid(format!("table '{}' must define at least one column", table.name)));
            }
            if !table_names.insert(table.name.as_str()) {
                return Err(invalid(format!("duplicate table '{}'", table.name)));
            }

            let mut column_names = HashSet::new();
            let mut columns = Vec::with_capacity(table.columns.len());
            for column in &table.columns {
                if column.name().trim().is_empty() {
                    return Err(invalid(format!("table '{}' has an unnamed column", table.name)));
                }
                if !column_names.insert(column.name()) {
                    return Err(invalid(format!(
                        "duplicate column '{}' in table '{}'",
                        column.name(),
                        table.name
                    )));
                }
                columns.push(CompiledColumn {
                    name: column.name().to_string(),
                    path: PathExpr::parse(column.path())?,
                });
            }

            tables.push(CompiledTable {
                name: table.name.clone(),
                rows: PathExpr::parse(&table.rows)?,
                columns,
            });
        }

        Ok(CompiledMapping {
            name: self.name.clone(),
            description: self.description.clone(),
            tables,
        })
    }
}

/// 將映射套用到原始文件。純函式：不做 I/O，也不修改輸入。
///
/// 欄位路徑找不到值時記為 `null`，資料列仍保留；
/// 只有資料列來源路徑本身不存在時，該表才會是空的。
pub fn apply(raw: &Value, mapping: &CompiledMapping) -> IntermediateRepresentation {
    let tables = mapping
        .tables
        .iter()
        .map(|table| {
            let records = select_rows(raw, &table.rows)
                .into_iter()
                .map(|row| project_row(raw, row, &table.columns))
                .collect::<Vec<_>>();

            tracing::debug!(
                "🔧 Mapping '{}': table '{}' produced {} rows",
                mapping.name,
                table.name,
                records.len()
            );

            Table {
                name: table.name.clone(),
                columns: table.column_names(),
                records,
            }
        })
        .collect();

    IntermediateRepresentation { tables }
}

/// 沒有 `[*]` 的來源路徑若指到陣列，就把陣列元素當作資料列
fn select_rows<'a>(raw: &'a Value, rows: &PathExpr) -> Vec<&'a Value> {
    let matches = rows.select(raw, raw);
    if rows.has_wildcard() {
        return matches;
    }

    let mut selected = Vec::new();
    for value in matches {
        match value {
            Value::Array(items) => selected.extend(items.iter()),
            other => selected.push(other),
        }
    }
    selected
}

fn project_row(raw: &Value, row: &Value, columns: &[CompiledColumn]) -> Record {
    let mut record = Record::default();
    for column in columns {
        let matches = column.path.select(raw, row);
        let value = if column.path.has_wildcard() {
            if matches.is_empty() {
                Value::Null
            } else {
                Value::Array(matches.into_iter().cloned().collect())
            }
        } else {
            matches.first().map(|v| (*v).clone()).unwrap_or(Value::Null)
        };
        record.data.insert(column.name.clone(), value);
    }
    record
}
