use std::fmt;

use serde::{Deserialize, Serialize};

/// A location in the target's (32-bit) address space.
///
/// Values read out of the game are never trusted as-is: a slot can hold zero
/// while a structure is not allocated yet, or a sign-reinterpreted negative
/// value while the game is switching instances. Both are rejected by
/// [`RemoteAddress::is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteAddress(u32);

impl RemoteAddress {
    pub const NULL: Self = Self(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn as_u64(self) -> u64 {
        u64::from(self.0)
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The raw bits read as a signed 32-bit quantity are below zero
    pub fn is_negative(self) -> bool {
        (self.0 as i32) < 0
    }

    pub fn is_valid(self) -> bool {
        !self.is_null() && !self.is_negative()
    }

    /// `Some(self)` only when the address passed validation
    pub fn checked(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }

    /// Absolute address of a field `offset` bytes into the pointed-to record
    pub fn offset(self, offset: u64) -> u64 {
        self.as_u64() + offset
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
