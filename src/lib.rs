// Library surface for the tutor core; the binary in main.rs is a thin CLI host.
pub mod app_dirs;
pub mod assistance;
pub mod config;
pub mod content;
pub mod controller;
pub mod error;
pub mod feedback;
pub mod history;
pub mod model;
pub mod session;
pub mod signal;
pub mod util;

pub use controller::{DifficultyController, DifficultyIndex};
pub use error::{Result, TutorError};
pub use session::{RoundOutcome, Tutor};
pub use signal::Signal;
