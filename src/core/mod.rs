pub mod engine;
pub mod extract;
pub mod pipeline;
pub mod preview;

pub use crate::domain::model::{TaskInfo, TaskStatus, UpscaleReport, UpscaledImage};
pub use crate::domain::ports::{ConfigProvider, Storage, UpscalePipeline};
pub use crate::utils::error::Result;
