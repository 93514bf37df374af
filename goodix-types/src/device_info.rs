//! Device information structures

use std::fmt;

use crate::mcu_state::McuState;

/// Device information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Transport description (bus and address for USB)
    pub transport: String,

    /// Firmware version
    pub firmware_version: String,

    /// MCU state at the time of the query
    pub state: McuState,
}

impl DeviceInfo {
    pub fn new(transport: String, firmware_version: String, state: McuState) -> Self {
        Self {
            transport,
            firmware_version,
            state,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[{}, FW: {}, {}]",
            self.transport, self.firmware_version, self.state
        )
    }
}
