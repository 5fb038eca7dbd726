//! Video generation providers.

mod openai;

pub use openai::{SoraModel, SoraProvider, SoraProviderBuilder};
