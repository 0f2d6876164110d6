use crate::{
    error::{FlyerError, Result},
    models::{EditRequest, ResultContext, Slot},
    service::GenerationService,
};

/// `ctx` is never modified; callers commit the returned context.
pub async fn apply_edit<S>(
    service: &S,
    ctx: &ResultContext,
    slot: Slot,
    prompt: &str,
) -> Result<ResultContext>
where
    S: GenerationService + ?Sized,
{
    if prompt.trim().is_empty() {
        return Err(FlyerError::Validation("Edit prompt is empty".into()));
    }
    let source = ctx.slot(slot).cloned().ok_or_else(|| {
        FlyerError::Validation(format!("Slot {} has no image to edit", slot))
    })?;

    log::info!("Editing {} with a new prompt", slot);
    let request = EditRequest {
        prompt: prompt.to_string(),
        image_url: source,
    };
    let image = service.edit(&request).await?.into_single()?;

    log::debug!("{} replaced by {}", slot, image);
    Ok(ctx.with_edited_slot(slot, image, prompt))
}

pub async fn regenerate<S>(service: &S, ctx: &ResultContext) -> Result<ResultContext>
where
    S: GenerationService + ?Sized,
{
    log::info!("Regenerating all slots");
    let images = service.regenerate(ctx).await?.into_many()?;
    if images.len() > Slot::ALL.len() {
        log::warn!(
            "Regenerate returned {} images, ignoring the extras",
            images.len()
        );
    }
    ctx.with_regenerated_images(&images)
}
