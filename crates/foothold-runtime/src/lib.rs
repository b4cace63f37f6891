//! Frame-budgeted scan scheduling over the column cache, plus the activation
//! modes and fade clock that drive it.
#![forbid(unsafe_code)]

pub mod fade;
pub mod mode;
pub mod scheduler;
mod settings;
pub mod visibility;
pub mod window;

pub use fade::FadeClock;
pub use mode::{ActivationMode, ActivationState, ModeAction};
pub use scheduler::{
    PassOp, PassStep, ScanKind, ScanProgress, ScanRequest, ScanScheduler, SchedulerState,
};
pub use settings::ScanSettings;
pub use visibility::{VisibilityCounts, VisibilityGate, evaluate_column};
pub use window::ViewWindow;
