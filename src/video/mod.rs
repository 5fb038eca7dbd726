//! Video generation jobs: request types, the provider trait and providers.

mod provider;
pub mod providers;
mod types;

pub use provider::VideoProvider;
pub use types::{
    Artifact, ContentVariant, Job, JobError, JobStatus, VideoGenerationRequest,
};
