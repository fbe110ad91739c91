use crate::domain::model::{RawDocument, ScenarioRequest};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 情境資料來源（OEP 或測試用的替身），需可做為 trait object 共享
#[async_trait]
pub trait ScenarioSource: Send + Sync {
    async fn fetch(&self, request: &ScenarioRequest) -> Result<RawDocument>;
}

#[async_trait]
impl<T: ScenarioSource + ?Sized> ScenarioSource for std::sync::Arc<T> {
    async fn fetch(&self, request: &ScenarioRequest) -> Result<RawDocument> {
        (**self).fetch(request).await
    }
}
