pub mod installer;
pub mod moonraker;
pub mod requirements;
pub mod sequence;

pub use crate::domain::model::{CommandOutput, CommandSpec, StepOutcome, StepReport};
pub use crate::domain::ports::{Host, InstallStep};
pub use crate::utils::error::Result;
