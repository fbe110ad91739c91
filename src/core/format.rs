use crate::domain::model::{IntermediateRepresentation, OutputFormat, SerializedResult, Table};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::io::{Cursor, Seek, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

pub const DEFAULT_ARCHIVE_FILENAME: &str = "scenario.zip";

/// 依輸出格式分派，只在這裡做一次判斷
pub fn serialize(
    ir: &IntermediateRepresentation,
    format: OutputFormat,
    archive_filename: &str,
) -> Result<SerializedResult> {
    match format {
        OutputFormat::Json => Ok(SerializedResult::Json { body: ir.to_json() }),
        OutputFormat::Csv => {
            let body = create_zip_csv(ir)?;
            Ok(SerializedResult::Zip {
                body,
                filename: archive_filename.to_string(),
            })
        }
    }
}

/// 每個資料表一個 `<table>.csv`，打包成記憶體中的 zip
pub fn create_zip_csv(ir: &IntermediateRepresentation) -> Result<Vec<u8>> {
    let cursor = write_zip_csv(ir, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// 寫入任意 `Write + Seek` 目標。
///
/// 任何錯誤都會提早返回並丟棄 `ZipWriter`，不會留下半開的資源；
/// 呼叫端拿到的只有完整的壓縮檔。
pub fn write_zip_csv<W: Write + Seek>(ir: &IntermediateRepresentation, sink: W) -> Result<W> {
    // 先檢查所有儲存格，避免寫到一半才發現巢狀值
    for table in &ir.tables {
        ensure_tabular(table)?;
    }

    let mut zip = ZipWriter::new(sink);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for table in &ir.tables {
        let entry_name = format!("{}.csv", table.name);
        tracing::debug!(
            "📦 Adding {} ({} rows) to archive",
            entry_name,
            table.records.len()
        );
        zip.start_file(entry_name, options)?;
        write_table_csv(table, &mut zip)?;
    }

    let sink = zip.finish()?;
    Ok(sink)
}

/// 將單一資料表寫成 CSV：標頭為欄位定義順序，缺值輸出空字串
pub fn write_table_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&table.columns)?;

    for (row, record) in table.records.iter().enumerate() {
        let mut fields = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let cell = record.get(column).unwrap_or(&Value::Null);
            fields.push(cell_to_text(table, column, row, cell)?);
        }
        csv_writer.write_record(&fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn ensure_tabular(table: &Table) -> Result<()> {
    for (row, record) in table.records.iter().enumerate() {
        for column in &table.columns {
            if let Some(cell) = record.get(column) {
                cell_to_text(table, column, row, cell)?;
            }
        }
    }
    Ok(())
}

fn cell_to_text(table: &Table, column: &str, row: usize, cell: &Value) -> Result<String> {
    match cell {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(_) | Value::Object(_) => Err(EtlError::UnsupportedMappingForFormat {
            table: table.name.clone(),
            column: column.to_string(),
            row,
            kind: if cell.is_array() { "array" } else { "object" }.to_string(),
        }),
    }
}
