pub mod editor;
pub mod poller;
pub mod submission;

pub use editor::{apply_edit, regenerate};
pub use poller::{poll_until_complete, PollState};
pub use submission::{submit, submit_and_wait};
