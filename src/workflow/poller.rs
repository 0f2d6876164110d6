use tokio_util::sync::CancellationToken;

use crate::{
    config::PollConfig,
    error::{FlyerError, Result},
    models::{parse_images, ImageRef, TaskReply},
    service::GenerationService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// `attempts` status checks have come back pending so far.
    Pending { attempts: u32 },
    Completed(Vec<ImageRef>),
    Failed(FlyerError),
}

impl PollState {
    pub fn start() -> Self {
        PollState::Pending { attempts: 0 }
    }

    // Terminal states absorb further replies.
    pub fn advance(
        self,
        reply: Result<TaskReply>,
        task_id: &str,
        max_attempts: Option<u32>,
    ) -> PollState {
        let attempts = match self {
            PollState::Pending { attempts } => attempts.saturating_add(1),
            terminal => return terminal,
        };

        match reply {
            Ok(TaskReply::Completed { images }) => match parse_images(images) {
                Ok(images) => PollState::Completed(images),
                Err(e) => PollState::Failed(e),
            },
            Ok(TaskReply::Pending { .. }) => match max_attempts {
                Some(max) if attempts >= max => PollState::Failed(FlyerError::PollTimeout {
                    task_id: task_id.to_string(),
                    attempts,
                }),
                _ => PollState::Pending { attempts },
            },
            Err(e) => PollState::Failed(e),
        }
    }
}

pub async fn poll_until_complete<S>(
    service: &S,
    task_id: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<Vec<ImageRef>>
where
    S: GenerationService + ?Sized,
{
    let mut state = PollState::start();

    loop {
        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Polling for task {} cancelled", task_id);
                return Err(FlyerError::Cancelled);
            }
            reply = service.check_status(task_id) => reply,
        };

        state = match state.advance(reply, task_id, config.max_attempts) {
            PollState::Completed(images) => {
                log::info!("Task {} completed with {} image(s)", task_id, images.len());
                return Ok(images);
            }
            PollState::Failed(err) => {
                log::error!("Polling for task {} failed: {}", task_id, err);
                return Err(err);
            }
            pending => pending,
        };

        if let PollState::Pending { attempts } = &state {
            log::info!(
                "Task {} still pending after {} check(s), next check in {:?}",
                task_id,
                attempts,
                config.interval
            );
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Polling for task {} cancelled", task_id);
                return Err(FlyerError::Cancelled);
            }
            _ = tokio::time::sleep(config.interval) => {}
        }
    }
}
