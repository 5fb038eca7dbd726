#![warn(missing_docs)]
//! Clipcast - generate a Sora video and deliver it to Telegram.
//!
//! A run is four sequential stages: submit a generation job, wait for it to
//! finish, download the MP4, and post it to a chat with a caption. Any
//! failure aborts the run; nothing is retried.
//!
//! # Quick Start
//!
//! ```no_run
//! use clipcast::{Config, Pipeline, SoraModel, VideoGenerationRequest};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> clipcast::Result<()> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::from_config(&config, SoraModel::Sora2)?;
//!     let request = VideoGenerationRequest::new("A cat surfing a wave")
//!         .with_duration(4)
//!         .with_resolution("720x1280");
//!     let report = pipeline.run(&request, "Surf's up", |_| {}).await?;
//!     println!("sent {}", report.artifact.path.display());
//!     Ok(())
//! }
//! ```
//!
//! # Waiting
//!
//! [`WaitStrategy::Poll`] re-fetches the job until it completes or fails.
//! [`WaitStrategy::FixedDelay`] sleeps once and downloads without checking.
//!
//! # Features
//!
//! - `cli` (default): the `clipcast` binary

pub mod config;
mod error;
pub mod pipeline;
pub mod poller;
pub mod telegram;
pub mod video;

// Re-export error types at crate root
pub use error::{ClipcastError, Result};

pub use config::Config;
pub use pipeline::{Pipeline, RunReport};
pub use poller::{render_progress, wait_for_job, WaitOutcome, WaitStrategy};
pub use telegram::{Delivery, TelegramUploader, TelegramUploaderBuilder};
pub use video::providers::{SoraModel, SoraProvider, SoraProviderBuilder};
pub use video::{
    Artifact, ContentVariant, Job, JobError, JobStatus, VideoGenerationRequest, VideoProvider,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ClipcastError, Result};
    pub use crate::pipeline::Pipeline;
    pub use crate::poller::WaitStrategy;
    pub use crate::telegram::TelegramUploader;
    pub use crate::video::providers::SoraProvider;
    pub use crate::video::{Job, JobStatus, VideoGenerationRequest, VideoProvider};
}
