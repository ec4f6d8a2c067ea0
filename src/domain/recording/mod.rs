//! Recording domain: sessions, capture sources, formats and lifecycle

pub mod duration;
pub mod format;
pub mod lifecycle;
pub mod session;
pub mod source;

pub use duration::Duration;
pub use format::{AudioFormat, EncoderSettings};
pub use lifecycle::{CaptureLifecycle, CaptureState, InvalidStateTransition};
pub use session::{
    artifact_name, mask_number, normalize_number, CatalogHandle, PendingRequest,
    RecordingSession,
};
pub use source::{AudioSource, AudioSourceChain, CapabilityTier};
