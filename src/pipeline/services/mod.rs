//! Application services for the pipeline.

mod registry;
mod transition;

pub use registry::{RegistryError, RegistryResult, StageRegistryService};
pub use transition::{
    MoveApplicationRequest, MoveOutcome, ReplayReport, StageTransitionService, TransitionError,
    TransitionResult,
};
