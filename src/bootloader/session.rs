/// Per power-on protocol state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Cleared by LEAVE_PROGMODE_ISP, which ends the protocol loop
    pub serving: bool,
    /// Byte address for the next program/read, set by LOAD_ADDRESS
    pub current_address: u32,
    /// Lowest byte address not yet erased this session
    pub erase_frontier: u32,
    /// Sequence number of the request being answered
    pub sequence: u8,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            serving: true,
            current_address: 0,
            erase_frontier: 0,
            sequence: 0,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
