//! Capture permission adapter

use cpal::traits::HostTrait;

use crate::application::ports::CapturePermission;

/// Capture is permitted while the host exposes at least one input device
#[derive(Debug, Clone, Copy, Default)]
pub struct InputDevicePermission;

impl InputDevicePermission {
    pub fn new() -> Self {
        Self
    }
}

impl CapturePermission for InputDevicePermission {
    fn is_granted(&self) -> bool {
        cpal::default_host()
            .input_devices()
            .map(|mut devices| devices.next().is_some())
            .unwrap_or(false)
    }
}
