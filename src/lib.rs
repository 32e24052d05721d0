pub mod config;
pub mod error;
pub mod runner;
pub mod shell_exec;
pub mod styling;
pub mod sync;
pub mod version;

pub use error::SyncError;
pub use sync::{Invocation, Step, StepRunner, Synchronizer};
pub use version::VersionString;
