use crate::domain::model::{ApiEnvelope, TaskInfo, UpscaleRequest, UpscaledImage};
use crate::domain::ports::{ConfigProvider, Storage, UpscalePipeline};
use crate::domain::services::output_file_name;
use crate::utils::error::{Result, UpscaleError};
use reqwest::Client;

pub const API_KEY_HEADER: &str = "x-freepik-api-key";

/// 呼叫 Freepik 放大 API 並將結果存入 Storage
pub struct FreepikPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) client: Client,
}

impl<S: Storage, C: ConfigProvider> FreepikPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            storage,
            config,
            client,
        })
    }

    fn task_url(&self, task_id: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_endpoint().trim_end_matches('/'),
            task_id
        )
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> UpscalePipeline for FreepikPipeline<S, C> {
    async fn submit(&self, image_url: &str) -> Result<String> {
        let request = UpscaleRequest::new(image_url, self.config.params());

        tracing::debug!(
            "Submitting upscale request to: {} (flavor: {}, scale: {}x)",
            self.config.api_endpoint(),
            request.params.flavor,
            request.params.scale_factor
        );

        let response = self
            .client
            .post(self.config.api_endpoint())
            .header(API_KEY_HEADER, self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Submit response status: {}", status);
        tracing::debug!("Submit raw response: {}", body);

        if !status.is_success() {
            return Err(UpscaleError::SubmitRejected {
                status: status.as_u16(),
                body,
            });
        }

        // 非 JSON 或缺少 data 都視為拒絕
        let info = match serde_json::from_str::<ApiEnvelope<TaskInfo>>(&body) {
            Ok(ApiEnvelope { data: Some(info) }) => info,
            _ => {
                return Err(UpscaleError::SubmitRejected {
                    status: status.as_u16(),
                    body,
                })
            }
        };

        match info.task_id.filter(|id| !id.trim().is_empty()) {
            Some(task_id) => {
                tracing::debug!("Task accepted: {}", task_id);
                Ok(task_id)
            }
            None => Err(UpscaleError::MissingTaskId { body }),
        }
    }

    async fn poll(&self, task_id: &str) -> Result<Option<TaskInfo>> {
        let url = self.task_url(task_id);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key())
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            tracing::warn!("Status poll for {} returned HTTP {}, will retry", task_id, status);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(UpscaleError::ApiStatusError {
                status: status.as_u16(),
                context: format!("Polling task {}", task_id),
            });
        }

        let body = response.text().await?;
        tracing::debug!("Poll raw response: {}", body);

        let envelope: ApiEnvelope<TaskInfo> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }

    async fn retrieve(
        &self,
        source_url: &str,
        task_id: &str,
        info: &TaskInfo,
    ) -> Result<UpscaledImage> {
        let result_url = info
            .generated
            .first()
            .ok_or_else(|| UpscaleError::NoImageGenerated {
                task_id: task_id.to_string(),
            })?;

        tracing::debug!("Downloading upscaled image from: {}", result_url);
        let response = self.client.get(result_url).send().await?;

        if !response.status().is_success() {
            return Err(UpscaleError::DownloadError {
                url: result_url.clone(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        tracing::debug!("Downloaded {} bytes", bytes.len());

        Ok(UpscaledImage {
            source_url: source_url.to_string(),
            result_url: result_url.clone(),
            bytes,
        })
    }

    async fn persist(&self, image: UpscaledImage) -> Result<String> {
        let file_name = output_file_name(self.config.naming(), &image.source_url, &image.result_url);

        tracing::debug!("Writing {} ({} bytes) to storage", file_name, image.bytes.len());
        self.storage.write_file(&file_name, &image.bytes).await?;

        Ok(self.storage.resolve(&file_name))
    }
}
