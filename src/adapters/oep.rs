use crate::config::toml_config::{SourceConfig, UpstreamConfig};
use crate::core::{RawDocument, ScenarioRequest, ScenarioSource};
use crate::domain::model::ScenarioIdentifier;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Open Energy Platform 的 REST 客戶端
pub struct OepClient {
    client: Client,
    sources: HashMap<String, SourceConfig>,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl OepClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            client: Client::new(),
            sources: config.sources.clone(),
            headers: config.headers.clone().unwrap_or_default(),
            timeout: config.timeout_seconds.map(Duration::from_secs),
        }
    }

    fn source_config(&self, name: &str) -> Result<&SourceConfig> {
        self.sources
            .get(name.trim())
            .ok_or_else(|| EtlError::UnknownSource {
                name: name.to_string(),
            })
    }

    /// `where` 條件：依 id 或名稱篩選
    fn where_clause(source: &SourceConfig, identifier: &ScenarioIdentifier) -> String {
        match identifier {
            ScenarioIdentifier::ById(id) => format!("{}={}", source.id_field, id),
            ScenarioIdentifier::ByName(name) => format!("{}={}", source.name_field, name.trim()),
        }
    }
}

#[async_trait]
impl ScenarioSource for OepClient {
    async fn fetch(&self, request: &ScenarioRequest) -> Result<RawDocument> {
        let source = self.source_config(&request.source)?;
        let not_found = || EtlError::ScenarioNotFound {
            source_name: request.source.clone(),
            identifier: request.identifier.to_string(),
        };

        // 構建請求
        let mut http_request = self
            .client
            .get(&source.endpoint)
            .query(&[("where", Self::where_clause(source, &request.identifier))]);

        // 添加自定義標頭
        for (key, value) in &self.headers {
            http_request = http_request.header(key, value);
        }

        // 設定超時
        if let Some(timeout) = self.timeout {
            http_request = http_request.timeout(timeout);
        }

        tracing::debug!("📡 Making API request to: {}", source.endpoint);

        let response = http_request.send().await?;
        let status = response.status();
        tracing::debug!("📡 API response status: {}", status);

        if status == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        if !status.is_success() {
            tracing::error!("❌ Upstream responded with {} for {}", status, request.identifier);
            return Err(EtlError::UpstreamUnavailable {
                message: format!("API request failed with status: {}", status),
            });
        }

        let body: Value = response.json().await.map_err(|e| EtlError::UpstreamUnavailable {
            message: format!("Upstream returned an invalid JSON payload: {}", e),
        })?;

        let is_empty = match &body {
            Value::Null => true,
            Value::Array(rows) => rows.is_empty(),
            _ => false,
        };
        if is_empty {
            tracing::warn!(
                "🔶 No rows for {} in source '{}'",
                request.identifier,
                request.source
            );
            return Err(not_found());
        }

        Ok(Arc::new(body))
    }
}
