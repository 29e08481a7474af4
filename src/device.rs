use std::fmt;

use candle_core::Device;

use crate::error::LoadError;

/// Compute device chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Cpu,
    Cuda(usize),
    Metal(usize),
}

impl DeviceKind {
    /// Prefers an accelerator the binary was built with, otherwise CPU.
    pub fn detect() -> Self {
        if candle_core::utils::cuda_is_available() {
            DeviceKind::Cuda(0)
        } else if candle_core::utils::metal_is_available() {
            DeviceKind::Metal(0)
        } else {
            DeviceKind::Cpu
        }
    }

    pub fn create(self) -> Result<Device, LoadError> {
        let device = match self {
            DeviceKind::Cpu => return Ok(Device::Cpu),
            DeviceKind::Cuda(ordinal) => Device::new_cuda(ordinal),
            DeviceKind::Metal(ordinal) => Device::new_metal(ordinal),
        };
        device.map_err(|source| LoadError::Device {
            device: self.to_string(),
            source,
        })
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
            DeviceKind::Metal(ordinal) => write!(f, "metal:{}", ordinal),
        }
    }
}

/// Detects the device and opens it. An accelerator that is compiled in but
/// cannot be opened falls back to CPU.
pub fn select_device() -> (DeviceKind, Device) {
    let kind = DeviceKind::detect();
    match kind.create() {
        Ok(device) => (kind, device),
        Err(e) => {
            log::warn!("{}, falling back to cpu", e);
            (DeviceKind::Cpu, Device::Cpu)
        }
    }
}
