use std::fmt;

use serde::Serialize;

/// Handle that native code uses to refer to a host value.
///
/// A `Handle` is a plain `u32` on the native side. `#[repr(transparent)]`
/// keeps a `[Handle]` layout-compatible with a packed `u32` array.
/// `Handle::NULL` (0) never resolves.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Handle(pub(crate) u32);

impl Handle {
    pub const NULL: Handle = Handle(0);
    pub(crate) const FIRST: Handle = Handle(1);

    /// Wraps a raw handle received from native code.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value handed to native code.
    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Handle> for u32 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}
