use serde::{Deserialize, Serialize};

use crate::error::{FlyerError, Result};
use crate::models::image::ImageRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub prompt: String,
    pub image_url: ImageRef,
}

/// `images` is a single reference on some deployments and an array on others.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ImagesPayload {
    One(String),
    Many(Vec<String>),
}

impl ImagesPayload {
    pub fn into_single(self) -> Result<ImageRef> {
        match self {
            ImagesPayload::One(image) => ImageRef::parse(image),
            ImagesPayload::Many(images) => {
                if images.len() > 1 {
                    log::warn!(
                        "Edit returned {} images for one slot, using the first",
                        images.len()
                    );
                }
                let first = images.into_iter().next().ok_or_else(|| {
                    FlyerError::Response("Edit response contained no images".into())
                })?;
                ImageRef::parse(first)
            }
        }
    }

    pub fn into_many(self) -> Result<Vec<ImageRef>> {
        match self {
            ImagesPayload::One(image) => Ok(vec![ImageRef::parse(image)?]),
            ImagesPayload::Many(images) => images.into_iter().map(ImageRef::parse).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesEnvelope {
    #[serde(default)]
    pub images: Option<ImagesPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceReply {
    pub response: ImagesEnvelope,
}

impl ServiceReply {
    pub fn images(self) -> Result<ImagesPayload> {
        self.response
            .images
            .ok_or_else(|| FlyerError::Response("Reply is missing response.images".into()))
    }
}
