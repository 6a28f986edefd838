use crate::domain::model::{TaskInfo, TaskStatus, UpscaleReport};
use crate::domain::ports::UpscalePipeline;
use crate::utils::error::{Result, UpscaleError};
use crate::utils::monitor::SystemMonitor;
use std::time::{Duration, Instant};

/// 輪詢策略：每次查詢前先等待 `interval`，最多 `max_attempts` 次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 20,
        }
    }
}

pub struct UpscaleEngine<P: UpscalePipeline> {
    pipeline: P,
    policy: PollPolicy,
    monitor: SystemMonitor,
}

impl<P: UpscalePipeline> UpscaleEngine<P> {
    pub fn new(pipeline: P, policy: PollPolicy) -> Self {
        Self::new_with_monitoring(pipeline, policy, false)
    }

    pub fn new_with_monitoring(pipeline: P, policy: PollPolicy, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            policy,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// submit → poll → retrieve → persist
    pub async fn run(&self, image_url: &str) -> Result<UpscaleReport> {
        let image_url = image_url.trim();
        if image_url.is_empty() {
            return Err(UpscaleError::ValidationError {
                message: "Please provide an image URL first".to_string(),
            });
        }

        let started = Instant::now();

        tracing::info!("🚀 Submitting {} for upscaling...", image_url);
        let task_id = self.pipeline.submit(image_url).await?;
        self.monitor.log_stats("Submit");

        tracing::info!("⏳ Processing task {} on the upscaling servers...", task_id);
        let (info, attempts) = self.wait_for_completion(&task_id).await?;
        self.monitor.log_stats("Poll");

        tracing::info!("📥 Task {} completed after {} polls, downloading result", task_id, attempts);
        let image = self.pipeline.retrieve(image_url, &task_id, &info).await?;
        let result_url = image.result_url.clone();
        self.monitor.log_stats("Retrieve");

        let output_path = self.pipeline.persist(image).await?;
        tracing::info!("✅ Upscaled image saved: {}", output_path);
        self.monitor.log_final_stats();

        Ok(UpscaleReport {
            task_id,
            source_url: image_url.to_string(),
            result_url,
            output_path,
            attempts,
            elapsed_ms: started.elapsed().as_millis(),
            completed_at: chrono::Utc::now(),
        })
    }

    async fn wait_for_completion(&self, task_id: &str) -> Result<(TaskInfo, u32)> {
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;

            let Some(info) = self.pipeline.poll(task_id).await? else {
                tracing::debug!("Poll {}: no task data yet", attempt);
                continue;
            };
            tracing::debug!("Poll {}: {:?}", attempt, info.status);

            match info.status {
                TaskStatus::Failed => {
                    return Err(UpscaleError::TaskFailed {
                        task_id: task_id.to_string(),
                    })
                }
                TaskStatus::Completed if info.generated.is_empty() => {
                    return Err(UpscaleError::NoImageGenerated {
                        task_id: task_id.to_string(),
                    })
                }
                TaskStatus::Completed => return Ok((info, attempt)),
                _ => {}
            }
        }

        Err(UpscaleError::PollTimeout {
            task_id: task_id.to_string(),
            attempts: self.policy.max_attempts,
        })
    }
}
