use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// 上游服務提供的放大風格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    #[default]
    Sublime,
    Photo,
    PhotoDenoiser,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Sublime => "sublime",
            Flavor::Photo => "photo",
            Flavor::PhotoDenoiser => "photo_denoiser",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sublime" => Ok(Flavor::Sublime),
            "photo" => Ok(Flavor::Photo),
            "photo_denoiser" | "photo-denoiser" => Ok(Flavor::PhotoDenoiser),
            other => Err(format!(
                "unknown flavor '{}', expected one of: sublime, photo, photo_denoiser",
                other
            )),
        }
    }
}

/// Tuning knobs sent alongside every upscale request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpscaleParams {
    pub sharpen: u8,
    pub smart_grain: u8,
    pub ultra_detail: u8,
    pub flavor: Flavor,
    pub scale_factor: u8,
}

impl Default for UpscaleParams {
    fn default() -> Self {
        Self {
            sharpen: 7,
            smart_grain: 7,
            ultra_detail: 30,
            flavor: Flavor::Sublime,
            scale_factor: 4,
        }
    }
}

/// POST body of the upscale endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpscaleRequest {
    pub image: String,
    #[serde(flatten)]
    pub params: UpscaleParams,
}

impl UpscaleRequest {
    pub fn new(image: impl Into<String>, params: UpscaleParams) -> Self {
        Self {
            image: image.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Created,
    InProgress,
    Completed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// 輪詢回應；欄位缺少或為 `null` 都視為預設值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub generated: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// API 回應外層：`{"data": ...}`，缺少 data 視為「尚無資料」
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Clone)]
pub struct UpscaledImage {
    pub source_url: String,
    pub result_url: String,
    pub bytes: Vec<u8>,
}

/// Summary of one completed run, written with `--report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpscaleReport {
    pub task_id: String,
    pub source_url: String,
    pub result_url: String,
    pub output_path: String,
    pub attempts: u32,
    pub elapsed_ms: u128,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// 以產生結果的 URL 命名
    #[default]
    Generated,
    /// 以原始圖片 URL 命名並加上 `upscaled_` 前綴
    Source,
}

impl FromStr for NamingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generated" => Ok(NamingStrategy::Generated),
            "source" => Ok(NamingStrategy::Source),
            other => Err(format!(
                "unknown naming strategy '{}', expected generated or source",
                other
            )),
        }
    }
}
