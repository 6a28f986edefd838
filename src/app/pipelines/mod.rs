pub mod freepik_pipeline;
