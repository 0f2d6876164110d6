use crate::{
    error::Result,
    models::{EditRequest, GenerationRequest, ImagesPayload, ResultContext, TaskReply},
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn submit(&self, request: &GenerationRequest) -> Result<TaskReply>;

    async fn check_status(&self, task_id: &str) -> Result<TaskReply>;

    async fn edit(&self, request: &EditRequest) -> Result<ImagesPayload>;

    async fn regenerate(&self, context: &ResultContext) -> Result<ImagesPayload>;
}

#[async_trait]
impl<T: GenerationService + ?Sized> GenerationService for Arc<T> {
    async fn submit(&self, request: &GenerationRequest) -> Result<TaskReply> {
        (**self).submit(request).await
    }

    async fn check_status(&self, task_id: &str) -> Result<TaskReply> {
        (**self).check_status(task_id).await
    }

    async fn edit(&self, request: &EditRequest) -> Result<ImagesPayload> {
        (**self).edit(request).await
    }

    async fn regenerate(&self, context: &ResultContext) -> Result<ImagesPayload> {
        (**self).regenerate(context).await
    }
}
