use async_trait::async_trait;
use oedatamodel_api::core::{RawDocument, ScenarioSource};
use oedatamodel_api::{
    EtlEngine, EtlError, LocalStorage, MappingRegistry, OutputFormat, Result, ScenarioRequest,
};
use serde_json::{json, Value};
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;

/// 回傳固定文件的來源，只認得 id=7
struct FixtureSource;

#[async_trait]
impl ScenarioSource for FixtureSource {
    async fn fetch(&self, request: &ScenarioRequest) -> Result<RawDocument> {
        if request.identifier.to_string() != "id=7" {
            return Err(EtlError::ScenarioNotFound {
                source_name: request.source.clone(),
                identifier: request.identifier.to_string(),
            });
        }
        Ok(Arc::new(json!([{
            "id": 7,
            "scenario": "base",
            "region": ["DE"],
            "year": 2030,
            "source": "test",
            "comment": null,
            "data": [
                {"id": 1, "region": ["DE"], "year": 2030, "value": 12.5, "unit": "GW",
                 "parameter_name": "installed capacity", "technology": "wind",
                 "technology_type": "onshore", "type": "scalar", "method": null, "comment": null},
                {"id": 2, "region": ["DE"], "year": 2030, "value": 3.0, "unit": "GW",
                 "parameter_name": "installed capacity", "technology": "solar",
                 "technology_type": "pv", "type": "scalar", "method": null, "comment": null}
            ]
        }])))
    }
}

fn engine() -> EtlEngine<FixtureSource> {
    EtlEngine::new(FixtureSource, Arc::new(MappingRegistry::builtin().unwrap()))
}

fn storage(dir: &TempDir) -> LocalStorage {
    LocalStorage::new(dir.path().to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_export_json_with_builtin_mapping() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let written = engine()
        .export(
            &ScenarioRequest::by_id("scenario", 7),
            "oed_scenario",
            OutputFormat::Json,
            &storage(&dir),
            "oed_scenario_7.json",
        )
        .await?;
    assert_eq!(written, "oed_scenario_7.json");

    let content = std::fs::read_to_string(dir.path().join(&written))?;
    let json: Value = serde_json::from_str(&content)?;

    assert_eq!(json["scenario"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["scenario"][0]["scenario"], "base");

    let data = json["data"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("data table missing"))?;
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["scenario_id"], 7);
    assert_eq!(data[1]["technology"], "solar");
    Ok(())
}

#[tokio::test]
async fn test_export_csv_rejects_list_columns() {
    // 內建映射的 region 是清單，無法寫成 CSV
    let dir = TempDir::new().unwrap();
    let err = engine()
        .export(
            &ScenarioRequest::by_id("scenario", 7),
            "oed_scenario",
            OutputFormat::Csv,
            &storage(&dir),
            "oed_scenario_7.zip",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::UnsupportedMappingForFormat { .. }));
    assert!(!dir.path().join("oed_scenario_7.zip").exists());
}

#[tokio::test]
async fn test_export_csv_with_custom_mapping() {
    let dir = TempDir::new().unwrap();
    let mut registry = MappingRegistry::new();
    registry
        .register_toml(
            "values.toml",
            r#"
name = "values"

[[tables]]
name = "values"
rows = "[0].data[*]"
columns = ["technology", "value", "unit", { name = "region", path = "region[0]" }]
"#,
        )
        .unwrap();
    let engine = EtlEngine::new(FixtureSource, Arc::new(registry));

    engine
        .export(
            &ScenarioRequest::by_id("scenario", 7),
            "values",
            OutputFormat::Csv,
            &storage(&dir),
            "exports/values.zip",
        )
        .await
        .unwrap();

    let file = std::fs::File::open(dir.path().join("exports/values.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut content = String::new();
    archive
        .by_name("values.csv")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();

    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec!["technology,value,unit,region", "wind,12.5,GW,DE", "solar,3.0,GW,DE"]
    );
}

#[tokio::test]
async fn test_export_missing_scenario_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let err = engine()
        .export(
            &ScenarioRequest::by_id("scenario", 8),
            "oed_scenario",
            OutputFormat::Json,
            &storage(&dir),
            "missing.json",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::ScenarioNotFound { .. }));
    assert!(!dir.path().join("missing.json").exists());
}
