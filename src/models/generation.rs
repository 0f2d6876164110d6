use serde::{Deserialize, Serialize};

use crate::error::{FlyerError, Result};
use crate::models::image::ImageRef;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub aspect_ratio: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.prompt.trim().is_empty() {
            missing.push("prompt");
        }
        if is_blank(&self.model) {
            missing.push("model");
        }
        if is_blank(&self.aspect_ratio) {
            missing.push("aspect ratio");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FlyerError::Validation(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub task_id: Option<String>,
    pub status: TaskStatus,
    /// Populated only once `status` is `Completed`.
    pub images: Vec<ImageRef>,
}

impl GenerationTask {
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            status: TaskStatus::Pending,
            images: Vec::new(),
        }
    }

    pub fn completed(task_id: Option<String>, images: Vec<ImageRef>) -> Self {
        Self {
            task_id,
            status: TaskStatus::Completed,
            images,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskReply {
    Pending {
        #[serde(default)]
        task_id: Option<String>,
    },
    Completed {
        #[serde(default)]
        images: Vec<String>,
    },
}

pub fn parse_images(raw: Vec<String>) -> Result<Vec<ImageRef>> {
    if raw.len() > 4 {
        log::warn!("Service returned {} images, keeping the first 4", raw.len());
    }
    let images = raw
        .into_iter()
        .take(4)
        .map(ImageRef::parse)
        .collect::<Result<Vec<_>>>()?;

    if images.is_empty() {
        return Err(FlyerError::Response(
            "Completed task carried no images".into(),
        ));
    }
    Ok(images)
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateBody<'a> {
    pub message: &'a GenerationRequest,
}
