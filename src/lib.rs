pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod service;
pub mod session;
pub mod workflow;

pub use config::{PollConfig, ServiceConfig};
pub use error::{FlyerError, Result};
pub use models::{
    EditRequest, GenerationRequest, GenerationTask, ImageRef, ResultContext, Slot, TaskStatus,
};
pub use service::{GenerationService, HttpGenerationService};
pub use session::{ActiveTab, Notice, Page, PreviewSelection, Session, SessionState, ViewState};
