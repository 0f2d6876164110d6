use crate::{
    error::{FlyerError, Result},
    models::{ImageRef, ResultContext, Slot},
    session::guard::Action,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    #[default]
    Creation,
    Examples,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Generation,
    Gallery,
    Design(ImageRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewSelection {
    #[default]
    Idle,
    Selected { slot: Slot, image: ImageRef },
}

impl PreviewSelection {
    pub fn select(ctx: &ResultContext, slot: Slot) -> Result<Self> {
        let image = ctx
            .slot(slot)
            .cloned()
            .ok_or_else(|| FlyerError::NotAllowed(format!("Slot {} has no image", slot)))?;
        Ok(PreviewSelection::Selected { slot, image })
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, PreviewSelection::Selected { .. })
    }

    pub fn slot(&self) -> Option<Slot> {
        match self {
            PreviewSelection::Selected { slot, .. } => Some(*slot),
            PreviewSelection::Idle => None,
        }
    }

    pub fn image(&self) -> Option<&ImageRef> {
        match self {
            PreviewSelection::Selected { image, .. } => Some(image),
            PreviewSelection::Idle => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MissingGenerationInput,
    MissingEditPrompt,
    LimitReached,
    Busy,
    NotAllowed(String),
    ServiceFailure(String),
}

impl Notice {
    /// `None` for cancellation: nobody is left to show it to.
    pub fn for_error(action: Action, err: &FlyerError) -> Option<Notice> {
        let notice = match err {
            FlyerError::Cancelled => return None,
            FlyerError::Quota(_) => Notice::LimitReached,
            FlyerError::Busy(_) => Notice::Busy,
            FlyerError::NotAllowed(msg) => Notice::NotAllowed(msg.clone()),
            FlyerError::Validation(_) if action == Action::Generate => {
                Notice::MissingGenerationInput
            }
            FlyerError::Validation(_) if action == Action::Edit => Notice::MissingEditPrompt,
            FlyerError::Validation(msg) => Notice::NotAllowed(msg.clone()),
            other => Notice::ServiceFailure(other.to_string()),
        };
        Some(notice)
    }

    pub fn message(&self) -> String {
        match self {
            Notice::MissingGenerationInput => {
                "Please Enter Prompt and Select Style before Generating".to_string()
            }
            Notice::MissingEditPrompt => "Please Enter Prompt before Generating".to_string(),
            Notice::LimitReached => {
                "Your Ip has already reached the maximum image generation limits".to_string()
            }
            Notice::Busy => "Please wait for the current request to finish".to_string(),
            Notice::NotAllowed(msg) => msg.clone(),
            Notice::ServiceFailure(msg) => format!("Something went wrong: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub page: Page,
    pub active_tab: ActiveTab,
    pub context: ResultContext,
    pub selection: PreviewSelection,
    /// Text in the edit prompt box.
    pub edit_prompt: String,
    pub in_flight: Option<Action>,
    pub notice: Option<Notice>,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }
}
