// Library surface for the binary, headless runs and integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod profile;
pub mod progression;
pub mod recorder;
pub mod runtime;
pub mod trainer;
pub mod ui;

pub use error::{IdentityError, RecordError, TrainerError};
pub use profile::{Difficulty, DifficultyProfile};
pub use trainer::{Phase, SessionState, Trainer, TrainerEvent};
