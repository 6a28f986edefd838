use crate::domain::model::{NamingStrategy, TaskInfo, UpscaleParams, UpscaledImage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// 供日誌與報告使用的完整路徑
    fn resolve(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> &str;
    fn output_path(&self) -> &str;
    fn params(&self) -> UpscaleParams;
    fn naming(&self) -> NamingStrategy;
    fn request_timeout(&self) -> Duration;
}

#[async_trait]
pub trait UpscalePipeline: Send + Sync {
    /// Submit an image URL and return the task id.
    async fn submit(&self, image_url: &str) -> Result<String>;
    /// `None` means the service answered without task data yet.
    async fn poll(&self, task_id: &str) -> Result<Option<TaskInfo>>;
    async fn retrieve(&self, source_url: &str, task_id: &str, info: &TaskInfo)
        -> Result<UpscaledImage>;
    async fn persist(&self, image: UpscaledImage) -> Result<String>;
}
