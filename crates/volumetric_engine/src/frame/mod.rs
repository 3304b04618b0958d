//! Per-frame orchestration
//!
//! Feature flag evaluation, kernel id resolution, and the orchestrator
//! driving the fixed per-frame sequence.

pub mod flags;
pub mod orchestrator;

pub use flags::{compute_flags, resolve_kernel_id, FeatureFlags, KindCandidates};
pub use orchestrator::{FrameStats, PipelineError, VolumetricPipeline};
