//! Job lifecycle: registry, restart policy and process supervision.

pub mod job;
pub mod registry;
pub mod restart;
pub mod supervisor;

pub use job::{Job, JobId, JobStatus};
pub use registry::{JobRegistry, JobUpdate};
pub use restart::RestartPolicy;
pub use supervisor::{PipelineOutcome, ProcessSupervisor};
