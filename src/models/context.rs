use serde::{Deserialize, Serialize};

use crate::error::{FlyerError, Result};
use crate::models::generation::GenerationRequest;
use crate::models::image::{ImageRef, Slot};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultContext {
    pub prompt: String,
    #[serde(default)]
    pub img1: Option<ImageRef>,
    #[serde(default)]
    pub img2: Option<ImageRef>,
    #[serde(default)]
    pub img3: Option<ImageRef>,
    #[serde(default)]
    pub img4: Option<ImageRef>,
    pub model: Option<String>,
    pub aspect_ratio: Option<String>,
}

impl ResultContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_completed(request: &GenerationRequest, images: &[ImageRef]) -> Self {
        let mut ctx = ResultContext {
            prompt: request.prompt.clone(),
            model: request.model.clone(),
            aspect_ratio: request.aspect_ratio.clone(),
            ..Default::default()
        };
        for (slot, image) in Slot::ALL.iter().zip(images) {
            *ctx.slot_mut(*slot) = Some(image.clone());
        }
        ctx
    }

    pub fn slot(&self, slot: Slot) -> Option<&ImageRef> {
        match slot {
            Slot::Img1 => self.img1.as_ref(),
            Slot::Img2 => self.img2.as_ref(),
            Slot::Img3 => self.img3.as_ref(),
            Slot::Img4 => self.img4.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<ImageRef> {
        match slot {
            Slot::Img1 => &mut self.img1,
            Slot::Img2 => &mut self.img2,
            Slot::Img3 => &mut self.img3,
            Slot::Img4 => &mut self.img4,
        }
    }

    pub fn filled_slots(&self) -> Vec<(Slot, &ImageRef)> {
        Slot::ALL
            .iter()
            .filter_map(|slot| self.slot(*slot).map(|image| (*slot, image)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.filled_slots().is_empty()
    }

    pub fn with_edited_slot(&self, slot: Slot, image: ImageRef, prompt: &str) -> Self {
        let mut next = self.clone();
        *next.slot_mut(slot) = Some(image);
        next.prompt = prompt.to_string();
        next
    }

    pub fn with_regenerated_images(&self, images: &[ImageRef]) -> Result<Self> {
        if images.len() < Slot::ALL.len() {
            return Err(FlyerError::Response(format!(
                "Regenerate returned {} image(s), expected 4",
                images.len()
            )));
        }
        let mut next = self.clone();
        for (slot, image) in Slot::ALL.iter().zip(images) {
            *next.slot_mut(*slot) = Some(image.clone());
        }
        Ok(next)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RegenerateBody<'a> {
    pub message: &'a ResultContext,
}
