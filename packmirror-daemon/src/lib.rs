//! Background agent: copy-cycle controller, log sink, autostart glue.

mod error;
pub mod autostart;
pub mod background;
pub mod controller;
pub mod log_rotation;
pub mod logging;
pub mod paths;

pub use autostart::{disable as disable_autostart, enable as enable_autostart, generate_plist};
pub use background::spawn_detached;
pub use controller::{CopyCycleController, CycleConfig, CycleReport, CycleState, RunSummary};
pub use error::DaemonError;
pub use logging::{LogOptions, LogSink};
