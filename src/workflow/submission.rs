use tokio_util::sync::CancellationToken;

use crate::{
    config::PollConfig,
    error::{FlyerError, Result},
    models::{parse_images, GenerationRequest, GenerationTask, ImageRef, TaskReply},
    service::GenerationService,
    workflow::poller::poll_until_complete,
};

/// Validates the request, then issues exactly one `/generate/modify` call.
/// Nothing is sent when validation fails.
pub async fn submit<S>(service: &S, request: &GenerationRequest) -> Result<GenerationTask>
where
    S: GenerationService + ?Sized,
{
    request.validate()?;

    log::info!(
        "Submitting generation (model: {}, aspect ratio: {})",
        request.model.as_deref().unwrap_or_default(),
        request.aspect_ratio.as_deref().unwrap_or_default()
    );

    match service.submit(request).await? {
        TaskReply::Completed { images } => {
            let images = parse_images(images)?;
            log::info!("Generation completed immediately");
            Ok(GenerationTask::completed(None, images))
        }
        TaskReply::Pending {
            task_id: Some(task_id),
        } if !task_id.trim().is_empty() => {
            log::info!("Generation queued as task {}", task_id);
            Ok(GenerationTask::pending(task_id))
        }
        TaskReply::Pending { .. } => Err(FlyerError::Response(
            "Pending reply did not include a task_id".into(),
        )),
    }
}

pub async fn submit_and_wait<S>(
    service: &S,
    request: &GenerationRequest,
    poll: &PollConfig,
    cancel: &CancellationToken,
) -> Result<Vec<ImageRef>>
where
    S: GenerationService + ?Sized,
{
    let task = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FlyerError::Cancelled),
        task = submit(service, request) => task?,
    };

    if task.is_completed() {
        return Ok(task.images);
    }

    match task.task_id {
        Some(task_id) => poll_until_complete(service, &task_id, poll, cancel).await,
        None => Err(FlyerError::Response("Pending task without identifier".into())),
    }
}
