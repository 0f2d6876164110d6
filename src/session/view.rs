use serde::Serialize;

use crate::{
    models::{ImageRef, Slot},
    session::state::{ActiveTab, Page, SessionState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonState {
    Enabled,
    Disabled,
}

impl ButtonState {
    fn when(enabled: bool) -> Self {
        if enabled {
            ButtonState::Enabled
        } else {
            ButtonState::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == ButtonState::Enabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub page: String,
    pub active_tab: String,
    pub loading_overlay: bool,
    pub prompt: String,
    pub visible_slots: Vec<(Slot, ImageRef)>,
    pub preview: Option<ImageRef>,
    pub edit_prompt: String,
    pub generate_button: ButtonState,
    pub select_button: ButtonState,
    pub edit_button: ButtonState,
    pub regenerate_button: ButtonState,
    pub notice: Option<String>,
}

impl ViewState {
    pub fn render(state: &SessionState) -> Self {
        let previewing = state.selection.is_visible();
        let idle = state.in_flight.is_none();

        ViewState {
            page: match &state.page {
                Page::Generation => "generation".to_string(),
                Page::Gallery => "gallery".to_string(),
                Page::Design(_) => "design".to_string(),
            },
            active_tab: match state.active_tab {
                ActiveTab::Creation => "creation".to_string(),
                ActiveTab::Examples => "examples".to_string(),
            },
            loading_overlay: state.is_loading(),
            prompt: state.context.prompt.clone(),
            visible_slots: state
                .context
                .filled_slots()
                .into_iter()
                .map(|(slot, image)| (slot, image.clone()))
                .collect(),
            preview: state.selection.image().cloned(),
            edit_prompt: state.edit_prompt.clone(),
            generate_button: ButtonState::when(idle),
            select_button: ButtonState::when(previewing),
            edit_button: ButtonState::when(previewing && idle),
            regenerate_button: ButtonState::when(!previewing && idle && !state.context.is_empty()),
            notice: state.notice.as_ref().map(|notice| notice.message()),
        }
    }
}
