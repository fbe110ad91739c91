use crate::core::format::{self, DEFAULT_ARCHIVE_FILENAME};
use crate::core::mapping;
use crate::core::registry::MappingRegistry;
use crate::core::{RawDocument, ScenarioSource, Storage};
use crate::domain::model::{OutputFormat, ScenarioRequest, SerializedResult};
use crate::utils::error::Result;
use serde_json::Value;
use std::sync::Arc;

/// 核心入口：套用映射並序列化成指定格式
pub fn transform(
    raw: &Value,
    mapping_name: &str,
    output: OutputFormat,
    registry: &MappingRegistry,
    archive_filename: &str,
) -> Result<SerializedResult> {
    let compiled = registry.get(mapping_name)?;
    let ir = mapping::apply(raw, compiled);
    tracing::debug!(
        "🔄 Mapping '{}' produced {} tables / {} records",
        mapping_name,
        ir.tables.len(),
        ir.record_count()
    );
    format::serialize(&ir, output, archive_filename)
}

pub struct EtlEngine<S: ScenarioSource> {
    source: S,
    registry: Arc<MappingRegistry>,
    archive_filename: String,
}

impl<S: ScenarioSource> EtlEngine<S> {
    pub fn new(source: S, registry: Arc<MappingRegistry>) -> Self {
        Self {
            source,
            registry,
            archive_filename: DEFAULT_ARCHIVE_FILENAME.to_string(),
        }
    }

    pub fn with_archive_filename(mut self, filename: impl Into<String>) -> Self {
        self.archive_filename = filename.into();
        self
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub async fn extract(&self, request: &ScenarioRequest) -> Result<RawDocument> {
        tracing::info!(
            "📡 Fetching scenario {} from source '{}'",
            request.identifier,
            request.source
        );
        self.source.fetch(request).await
    }

    pub fn transform(
        &self,
        raw: &Value,
        mapping_name: &str,
        output: OutputFormat,
    ) -> Result<SerializedResult> {
        transform(raw, mapping_name, output, &self.registry, &self.archive_filename)
    }

    /// 完整流程：取得 -> 映射 -> 序列化
    pub async fn run(
        &self,
        request: &ScenarioRequest,
        mapping_name: &str,
        output: OutputFormat,
    ) -> Result<SerializedResult> {
        // 先確認映射存在，未知映射不需要呼叫上游
        self.registry.get(mapping_name)?;

        let raw = self.extract(request).await?;
        let result = self.transform(&raw, mapping_name, output)?;

        tracing::info!(
            "✅ Scenario {} transformed with mapping '{}' as {}",
            request.identifier,
            mapping_name,
            output
        );
        Ok(result)
    }

    /// 執行完整流程並透過 Storage 寫出檔案，回傳寫入的檔名
    pub async fn export<T: Storage>(
        &self,
        request: &ScenarioRequest,
        mapping_name: &str,
        output: OutputFormat,
        storage: &T,
        filename: &str,
    ) -> Result<String> {
        let result = self.run(request, mapping_name, output).await?;

        let bytes = match &result {
            SerializedResult::Json { body } => serde_json::to_vec_pretty(body)?,
            SerializedResult::Zip { body, .. } => body.clone(),
        };

        tracing::debug!("💾 Writing {} ({} bytes) to storage", filename, bytes.len());
        storage.write_file(filename, &bytes).await?;
        Ok(filename.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapping::MappingDefinition;
    use crate::utils::error::{EtlError, MappingError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct StaticSource {
        documents: HashMap<ScenarioRequest, Value>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new() -> Self {
            let mut documents = HashMap::new();
            documents.insert(
                ScenarioRequest::by_id("scenario", 5),
                json!({
                    "scenario_id": 5,
                    "entries": [{"name": "a", "value": 10}, {"name": "b"}]
                }),
            );
            Self {
                documents,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ScenarioSource for StaticSource {
        async fn fetch(&self, request: &ScenarioRequest) -> Result<RawDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.documents
                .get(request)
                .cloned()
                .map(Arc::new)
                .ok_or_else(|| EtlError::ScenarioNotFound {
                    source_name: request.source.clone(),
                    identifier: request.identifier.to_string(),
                })
        }
    }

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn registry() -> Arc<MappingRegistry> {
        let mut registry = MappingRegistry::new();
        registry
            .register(
                MappingDefinition::from_toml_str(
                    r#"
name = "entries"
[[tables]]
name = "entries"
rows = "entries[*]"
columns = ["name", "value"]
"#,
                )
                .unwrap(),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_run_json() {
        let engine = EtlEngine::new(StaticSource::new(), registry());
        let result = engine
            .run(&ScenarioRequest::by_id("scenario", 5), "entries", OutputFormat::Json)
            .await
            .unwrap();

        assert_eq!(
            result,
            SerializedResult::Json {
                body: json!({"entries": [{"name": "a", "value": 10}, {"name": "b", "value": null}]})
            }
        );
    }

    #[tokio::test]
    async fn test_run_csv_uses_configured_filename() {
        let engine =
            EtlEngine::new(StaticSource::new(), registry()).with_archive_filename("entries.zip");
        let result = engine
            .run(&ScenarioRequest::by_id("scenario", 5), "entries", OutputFormat::Csv)
            .await
            .unwrap();

        match result {
            SerializedResult::Zip { filename, body } => {
                assert_eq!(filename, "entries.zip");
                assert!(!body.is_empty());
            }
            other => panic!("expected zip, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_mapping_skips_fetch() {
        let source = StaticSource::new();
        let engine = EtlEngine::new(source, registry());
        let err = engine
            .run(&ScenarioRequest::by_id("scenario", 5), "nope", OutputFormat::Json)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EtlError::MappingApplication(MappingError::UnknownMapping { .. })
        ));
        assert_eq!(engine.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let engine = EtlEngine::new(StaticSource::new(), registry());
        let err = engine
            .run(&ScenarioRequest::by_id("scenario", 99), "entries", OutputFormat::Json)
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::ScenarioNotFound { .. }));
    }

    #[tokio::test]
    async fn test_export_writes_pretty_json() {
        let storage = MockStorage::default();
        let engine = EtlEngine::new(StaticSource::new(), registry());
        let written = engine
            .export(
                &ScenarioRequest::by_id("scenario", 5),
                "entries",
                OutputFormat::Json,
                &storage,
                "entries_5.json",
            )
            .await
            .unwrap();
        assert_eq!(written, "entries_5.json");

        let bytes = storage.read_file("entries_5.json").await.unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["entries"][0]["name"], "a");
        assert!(String::from_utf8(bytes).unwrap().contains('\n'));
    }

    #[test]
    fn test_transform_free_function() {
        let raw = json!({"entries": [{"name": "a", "value": 1}]});
        let result = transform(&raw, "entries", OutputFormat::Json, &registry(), "x.zip").unwrap();
        assert_eq!(result.content_type(), "application/json");
    }
}
