pub mod guard;
#[allow(clippy::module_inception)]
pub mod session;
pub mod state;
pub mod view;

pub use guard::Action;
pub use session::Session;
pub use state::{ActiveTab, Notice, Page, PreviewSelection, SessionState};
pub use view::{ButtonState, ViewState};
