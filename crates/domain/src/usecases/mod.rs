//! Application use cases / business logic

pub mod submit;
pub mod transform;

pub use submit::{RewriteFallback, SubmissionConfig, SubmissionError, SubmissionService};
pub use transform::{PipelineError, TransformationPipeline};
