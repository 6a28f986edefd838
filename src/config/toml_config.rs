use crate::domain::model::{Flavor, NamingStrategy};
use crate::utils::error::{Result, UpscaleError};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// 設定檔內容；所有區段皆可省略，省略時使用內建預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub upscale: UpscaleSection,
    #[serde(default)]
    pub polling: PollingSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpscaleSection {
    pub flavor: Option<Flavor>,
    pub sharpen: Option<u8>,
    pub smart_grain: Option<u8>,
    pub ultra_detail: Option<u8>,
    pub scale_factor: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollingSection {
    pub interval_seconds: Option<u64>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub directory: Option<String>,
    pub naming: Option<NamingStrategy>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| UpscaleError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FREEPIK_API_KEY})，找不到時保留原字串
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 未解析的 `${VAR}` 佔位字串視同未設定
    pub fn api_key(&self) -> Option<&str> {
        self.api
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !ENV_VAR_PATTERN.is_match(key))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.api.endpoint {
            crate::utils::validation::validate_url("api.endpoint", endpoint)?;
        }
        if let Some(directory) = &self.output.directory {
            crate::utils::validation::validate_path("output.directory", directory)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[api]
endpoint = "https://api.example.com/v1/upscale"
api_key = "secret"
timeout_seconds = 15

[upscale]
flavor = "photo"
sharpen = 10
scale_factor = 2

[polling]
interval_seconds = 5
max_attempts = 12

[output]
directory = "./upscaled"
naming = "source"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api.endpoint.as_deref(), Some("https://api.example.com/v1/upscale"));
        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.upscale.flavor, Some(Flavor::Photo));
        assert_eq!(config.upscale.smart_grain, None);
        assert_eq!(config.polling.max_attempts, Some(12));
        assert_eq!(config.output.naming, Some(NamingStrategy::Source));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.api.endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PIK_TEST_UPSCALE_KEY", "from-env");

        let config = TomlConfig::from_toml_str(
            r#"
[api]
api_key = "${PIK_TEST_UPSCALE_KEY}"
"#,
        )
        .unwrap();
        assert_eq!(config.api_key(), Some("from-env"));

        std::env::remove_var("PIK_TEST_UPSCALE_KEY");
    }

    #[test]
    fn test_unresolved_placeholder_counts_as_missing_key() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
api_key = "${PIK_TEST_NEVER_DEFINED_KEY}"
"#,
        )
        .unwrap();
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
endpoint = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_flavor_is_rejected() {
        let result = TomlConfig::from_toml_str(
            r#"
[upscale]
flavor = "vivid"
"#,
        );
        assert!(matches!(
            result,
            Err(UpscaleError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[polling]\ninterval_seconds = 1\nmax_attempts = 3\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.polling.interval_seconds, Some(1));
        assert_eq!(config.polling.max_attempts, Some(3));
    }
}
