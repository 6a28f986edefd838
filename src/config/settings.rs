use crate::config::toml_config::TomlConfig;
use crate::core::engine::PollPolicy;
use crate::domain::model::{Flavor, NamingStrategy, UpscaleParams};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.freepik.com/v1/ai/image-upscaler-precision-v2";
pub const API_KEY_ENV: &str = "FREEPIK_API_KEY";
pub const OUTPUT_FOLDER_NAME: &str = "Freepik_Upscaled_Images";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 命令列覆寫值；`None` 表示沿用設定檔或預設值
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_key: Option<String>,
    pub api_endpoint: Option<String>,
    pub output_dir: Option<String>,
    pub naming: Option<NamingStrategy>,
    pub flavor: Option<Flavor>,
    pub sharpen: Option<u8>,
    pub smart_grain: Option<u8>,
    pub ultra_detail: Option<u8>,
    pub scale_factor: Option<u8>,
    pub poll_interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
}

/// Effective settings after merging CLI overrides, the TOML file and defaults.
#[derive(Debug, Clone)]
pub struct UpscaleSettings {
    pub api_endpoint: String,
    pub api_key: Option<String>,
    pub output_path: String,
    pub params: UpscaleParams,
    pub naming: NamingStrategy,
    pub request_timeout: Duration,
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
}

impl UpscaleSettings {
    /// 優先順序：命令列 > 設定檔 > 環境變數 (僅 API key) > 預設值
    pub fn resolve(file: Option<&TomlConfig>, overrides: SettingsOverrides) -> Self {
        let file = file.cloned().unwrap_or_default();
        let defaults = UpscaleParams::default();

        let api_key = overrides
            .api_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| file.api_key().map(str::to_string))
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()));

        let params = UpscaleParams {
            sharpen: overrides.sharpen.or(file.upscale.sharpen).unwrap_or(defaults.sharpen),
            smart_grain: overrides
                .smart_grain
                .or(file.upscale.smart_grain)
                .unwrap_or(defaults.smart_grain),
            ultra_detail: overrides
                .ultra_detail
                .or(file.upscale.ultra_detail)
                .unwrap_or(defaults.ultra_detail),
            flavor: overrides.flavor.or(file.upscale.flavor).unwrap_or(defaults.flavor),
            scale_factor: overrides
                .scale_factor
                .or(file.upscale.scale_factor)
                .unwrap_or(defaults.scale_factor),
        };

        let output_path = overrides
            .output_dir
            .or(file.output.directory)
            .map(|dir| expand_home(&dir))
            .unwrap_or_else(|| default_output_dir().display().to_string());

        let policy = PollPolicy::default();

        Self {
            api_endpoint: overrides
                .api_endpoint
                .or(file.api.endpoint)
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            api_key,
            output_path,
            params,
            naming: overrides.naming.or(file.output.naming).unwrap_or_default(),
            request_timeout: Duration::from_secs(
                file.api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            poll_interval_secs: overrides
                .poll_interval_secs
                .or(file.polling.interval_seconds)
                .unwrap_or(policy.interval.as_secs()),
            max_attempts: overrides
                .max_attempts
                .or(file.polling.max_attempts)
                .unwrap_or(policy.max_attempts),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.max_attempts,
        }
    }
}

impl Validate for UpscaleSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.endpoint", &self.api_endpoint)?;
        validation::validate_required_field("api.api_key", &self.api_key)?;
        validation::validate_path("output.directory", &self.output_path)?;

        validation::validate_range("upscale.sharpen", self.params.sharpen, 0, 100)?;
        validation::validate_range("upscale.smart_grain", self.params.smart_grain, 0, 100)?;
        validation::validate_range("upscale.ultra_detail", self.params.ultra_detail, 0, 100)?;
        validation::validate_range("upscale.scale_factor", self.params.scale_factor, 2, 16)?;

        validation::validate_positive_number("polling.interval_seconds", self.poll_interval_secs, 1)?;
        validation::validate_positive_number("polling.max_attempts", u64::from(self.max_attempts), 1)?;
        validation::validate_positive_number(
            "api.timeout_seconds",
            self.request_timeout.as_secs(),
            1,
        )?;
        Ok(())
    }
}

impl ConfigProvider for UpscaleSettings {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn params(&self) -> UpscaleParams {
        self.params
    }

    fn naming(&self) -> NamingStrategy {
        self.naming
    }

    fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// `~/Desktop/Freepik_Upscaled_Images`，找不到桌面時退回家目錄或工作目錄
pub fn default_output_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .map(|desktop| desktop.join(OUTPUT_FOLDER_NAME))
        .unwrap_or_else(|| PathBuf::from(OUTPUT_FOLDER_NAME))
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).display().to_string(),
        _ => path.to_string(),
    }
}
