//! Type definitions for goodix

pub mod device_info;
pub mod error;
pub mod mcu_state;

pub use device_info::DeviceInfo;
pub use error::{Error, Result};
pub use mcu_state::{McuState, McuStatus};
