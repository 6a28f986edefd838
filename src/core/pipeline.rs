pub use crate::app::pipelines::freepik_pipeline::{FreepikPipeline, API_KEY_HEADER};
