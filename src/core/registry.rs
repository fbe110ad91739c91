use crate::core::mapping::{CompiledMapping, MappingDefinition};
use crate::utils::error::{EtlError, MappingError, Result};
use std::collections::HashMap;
use std::path::Path;

/// 隨程式一起發佈的映射定義
const BUILTIN_MAPPINGS: &[(&str, &str)] = &[(
    "oed_scenario.toml",
    include_str!("../../mappings/oed_scenario.toml"),
)];

/// 映射名稱 -> 已編譯規則。啟動時建立並驗證，之後唯讀共享。
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: HashMap<String, CompiledMapping>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只含內建映射的註冊表
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for (file, content) in BUILTIN_MAPPINGS {
            registry.register_toml(file, content)?;
        }
        Ok(registry)
    }

    /// 內建映射加上目錄中的自訂映射
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut registry = Self::builtin()?;
        registry.load_dir(dir)?;
        Ok(registry)
    }

    /// 載入目錄中所有 `*.toml`，依檔名排序以確保結果穩定
    pub fn load_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("toml") {
                files.push(path);
            }
        }
        files.sort();

        for path in &files {
            let content = std::fs::read_to_string(path)?;
            let label = path.display().to_string();
            self.register_toml(&label, &content)?;
        }

        tracing::info!(
            "📚 Loaded {} mapping file(s) from {}",
            files.len(),
            dir.display()
        );
        Ok(files.len())
    }

    pub fn register_toml(&mut self, label: &str, content: &str) -> Result<()> {
        let definition = MappingDefinition::from_toml_str(content).map_err(|e| match e {
            MappingError::InvalidDefinition { reason, .. } => MappingError::InvalidDefinition {
                mapping: label.to_string(),
                reason,
            },
            other => other,
        })?;
        self.register(definition)
    }

    pub fn register(&mut self, definition: MappingDefinition) -> Result<()> {
        let compiled = definition.compile()?;
        if self.mappings.contains_key(&compiled.name) {
            return Err(EtlError::MappingApplication(MappingError::DuplicateMapping {
                name: compiled.name,
            }));
        }

        tracing::debug!(
            "🗺️ Registered mapping '{}' with {} table(s)",
            compiled.name,
            compiled.tables.len()
        );
        self.mappings.insert(compiled.name.clone(), compiled);
        Ok(())
    }

    /// 請求時查找；找不到時列出可用的映射名稱
    pub fn get(&self, name: &str) -> std::result::Result<&CompiledMapping, MappingError> {
        self.mappings
            .get(name)
            .ok_or_else(|| MappingError::UnknownMapping {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.mappings.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledMapping> {
        let mut mappings: Vec<&CompiledMapping> = self.mappings.values().collect();
        mappings.sort_by(|a, b| a.name.cmp(&b.name));
        mappings.into_iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM: &str = r#"
name = "custom"

[[tables]]
name = "entries"
rows = "entries[*]"
columns = ["name", "value"]
"#;

    #[test]
    fn test_builtin_mappings_compile() {
        let registry = MappingRegistry::builtin().unwrap();
        assert!(!registry.is_empty());
        let mapping = registry.get("oed_scenario").unwrap();
        assert_eq!(mapping.tables[0].name, "scenario");
    }

    #[test]
    fn test_unknown_mapping_lists_available() {
        let mut registry = MappingRegistry::new();
        registry.register_toml("custom.toml", CUSTOM).unwrap();

        let err = registry.get("missing").unwrap_err();
        match err {
            MappingError::UnknownMapping { name, available } => {
                assert_eq!(name, "missing");
                assert_eq!(available, "custom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_mapping_rejected() {
        let mut registry = MappingRegistry::new();
        registry.register_toml("a.toml", CUSTOM).unwrap();
        let err = registry.register_toml("b.toml", CUSTOM).unwrap_err();
        assert!(matches!(
            err,
            EtlError::MappingApplication(MappingError::DuplicateMapping { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_toml_reports_file_label() {
        let mut registry = MappingRegistry::new();
        let err = registry.register_toml("broken.toml", "tables = 3").unwrap_err();
        match err {
            EtlError::MappingApplication(MappingError::InvalidDefinition { mapping, .. }) => {
                assert_eq!(mapping, "broken.toml");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
