use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpscaleError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Upscale request rejected (HTTP {status}): {body}")]
    SubmitRejected { status: u16, body: String },

    #[error("No task_id found in response: {body}")]
    MissingTaskId { body: String },

    #[error("{context}: HTTP {status}")]
    ApiStatusError { status: u16, context: String },

    #[error("Upscale task {task_id} reported a failure")]
    TaskFailed { task_id: String },

    #[error("Upscale task {task_id} completed but did not generate an image")]
    NoImageGenerated { task_id: String },

    #[error("Upscale task {task_id} did not finish after {attempts} polls")]
    PollTimeout { task_id: String, attempts: u32 },

    #[error("Failed to download {url}: HTTP {status}")]
    DownloadError { url: String, status: u16 },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Api,
    Task,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UpscaleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UpscaleError::MissingConfigError { .. }
            | UpscaleError::InvalidConfigValueError { .. }
            | UpscaleError::ConfigValidationError { .. }
            | UpscaleError::ValidationError { .. } => ErrorCategory::Configuration,
            UpscaleError::ApiError(_) | UpscaleError::DownloadError { .. } => {
                ErrorCategory::Network
            }
            UpscaleError::SubmitRejected { .. }
            | UpscaleError::MissingTaskId { .. }
            | UpscaleError::ApiStatusError { .. } => ErrorCategory::Api,
            UpscaleError::TaskFailed { .. }
            | UpscaleError::NoImageGenerated { .. }
            | UpscaleError::PollTimeout { .. } => ErrorCategory::Task,
            UpscaleError::IoError(_)
            | UpscaleError::SerializationError(_)
            | UpscaleError::ImageError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 使用者輸入問題，補上即可
            UpscaleError::ValidationError { .. } => ErrorSeverity::Low,
            // 重試可能成功
            UpscaleError::ApiError(_)
            | UpscaleError::PollTimeout { .. }
            | UpscaleError::DownloadError { .. } => ErrorSeverity::Medium,
            UpscaleError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            UpscaleError::MissingConfigError { .. } => {
                "Set FREEPIK_API_KEY in the environment or a .env file, or pass --api-key"
            }
            UpscaleError::InvalidConfigValueError { .. }
            | UpscaleError::ConfigValidationError { .. } => {
                "Check the configuration file and command line arguments"
            }
            UpscaleError::ValidationError { .. } => "Paste an image URL first",
            UpscaleError::ApiError(_) => "Check your network connection and try again",
            UpscaleError::SubmitRejected { status: 401, .. }
            | UpscaleError::SubmitRejected { status: 403, .. } => {
                "Verify that the API key is valid and has upscaler access"
            }
            UpscaleError::SubmitRejected { .. } | UpscaleError::MissingTaskId { .. } => {
                "Make sure the image URL is publicly reachable and the parameters are in range"
            }
            UpscaleError::ApiStatusError { .. } => "The remote server refused the request; retry later",
            UpscaleError::TaskFailed { .. } => "Try a different image or flavor",
            UpscaleError::NoImageGenerated { .. } => {
                "The input URL is likely unsupported; try a direct link to a JPG/PNG/WEBP file"
            }
            UpscaleError::PollTimeout { .. } => {
                "Increase --max-attempts or --poll-interval and run again"
            }
            UpscaleError::DownloadError { .. } => "Retry the download later",
            UpscaleError::IoError(_) => "Check that the output directory is writable",
            UpscaleError::SerializationError(_) => "The API returned unexpected JSON",
            UpscaleError::ImageError(_) => "The URL does not point to a supported image format",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            UpscaleError::ValidationError { .. } => {
                "Input required: please provide an image URL.".to_string()
            }
            UpscaleError::TaskFailed { .. } => {
                "The upscaling service reported a failure for this task.".to_string()
            }
            UpscaleError::NoImageGenerated { .. } => {
                "The task completed but no image was generated.".to_string()
            }
            UpscaleError::PollTimeout { .. } => {
                "Upscaling took too long or didn't finish.".to_string()
            }
            other => format!("Something went wrong: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpscaleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_errors_are_categorized() {
        let err = UpscaleError::PollTimeout {
            task_id: "t-1".to_string(),
            attempts: 20,
        };
        assert_eq!(err.category(), ErrorCategory::Task);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("20 polls"));
    }

    #[test]
    fn test_unauthorized_submit_suggests_key_check() {
        let err = UpscaleError::SubmitRejected {
            status: 401,
            body: "{}".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Api);
        assert!(err.recovery_suggestion().contains("API key"));
    }

    #[test]
    fn test_missing_input_is_low_severity() {
        let err = UpscaleError::ValidationError {
            message: "Please provide an image URL first".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.severity() < ErrorSeverity::Medium);
    }

    #[test]
    fn test_io_error_is_critical() {
        let err = UpscaleError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("Something went wrong"));
    }
}
