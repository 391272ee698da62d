//! Provider abstraction and asynchronous job lifecycle.

mod poller;
mod provider;
pub mod providers;
mod types;

pub use poller::JobPoller;
pub use provider::{ProviderAdapter, ProviderRegistry};
pub use types::{
    ClipRequest, GenerationJob, ImagePayload, JobStatus, PayloadFormat, ProviderKind,
    SubmitRequest,
};
