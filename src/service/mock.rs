use crate::{
    error::{FlyerError, Result},
    models::{EditRequest, GenerationRequest, ImagesPayload, ResultContext, TaskReply},
    service::traits::GenerationService,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replays queued replies per endpoint and counts calls. An endpoint with an
/// empty queue fails with a service error.
#[derive(Default)]
pub struct ScriptedService {
    submits: Mutex<VecDeque<Result<TaskReply>>>,
    statuses: Mutex<VecDeque<Result<TaskReply>>>,
    edits: Mutex<VecDeque<Result<ImagesPayload>>>,
    regenerates: Mutex<VecDeque<Result<ImagesPayload>>>,
    latency: Option<Duration>,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub edit_calls: AtomicUsize,
    pub regenerate_calls: AtomicUsize,
    pub edit_requests: Mutex<Vec<EditRequest>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn on_submit(self, reply: Result<TaskReply>) -> Self {
        self.submits.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_status(self, reply: Result<TaskReply>) -> Self {
        self.statuses.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_edit(self, reply: Result<ImagesPayload>) -> Self {
        self.edits.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_regenerate(self, reply: Result<ImagesPayload>) -> Self {
        self.regenerates.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn respond<T>(
        &self,
        counter: &AtomicUsize,
        queue: &Mutex<VecDeque<Result<T>>>,
        endpoint: &str,
    ) -> Result<T> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FlyerError::service(format!("no scripted {} reply", endpoint))))
    }
}

pub fn pending(task_id: &str) -> Result<TaskReply> {
    Ok(TaskReply::Pending {
        task_id: Some(task_id.to_string()),
    })
}

pub fn completed(images: &[&str]) -> Result<TaskReply> {
    Ok(TaskReply::Completed {
        images: images.iter().map(|s| s.to_string()).collect(),
    })
}

pub fn many(images: &[&str]) -> Result<ImagesPayload> {
    Ok(ImagesPayload::Many(
        images.iter().map(|s| s.to_string()).collect(),
    ))
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn submit(&self, _request: &GenerationRequest) -> Result<TaskReply> {
        self.respond(&self.submit_calls, &self.submits, "submit")
            .await
    }

    async fn check_status(&self, _task_id: &str) -> Result<TaskReply> {
        self.respond(&self.status_calls, &self.statuses, "status")
            .await
    }

    async fn edit(&self, request: &EditRequest) -> Result<ImagesPayload> {
        self.edit_requests.lock().unwrap().push(request.clone());
        self.respond(&self.edit_calls, &self.edits, "edit").await
    }

    async fn regenerate(&self, _context: &ResultContext) -> Result<ImagesPayload> {
        self.respond(&self.regenerate_calls, &self.regenerates, "regenerate")
            .await
    }
}
