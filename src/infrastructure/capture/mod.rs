//! Audio capture infrastructure module
//!
//! Provides capture handles backed by cpal input streams.
//! Finished recordings are encoded to FLAC.

mod cpal_capture;
mod flac_encoder;
mod permission;

pub use cpal_capture::{CpalCapture, CpalCaptureBackend};
pub use flac_encoder::{encode_to_flac, EncodingError};
pub use permission::InputDevicePermission;
