use serde::Serialize;

use crate::handles::handle::Handle;

/// Opaque native handle plus the native callback that frees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativeHandle {
    pub handle: usize,
    pub free_cb: usize,
}

/// Opaque native pointer plus its native type-info record (which carries the
/// free callback on the native side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativePointer {
    pub ptr: usize,
    pub info: usize,
}

/// Identity-invariant data bound to a reference-type value.
///
/// Shared between the table's back-reference map and the value's reclaim
/// watch, so attachments made after registration are visible to the
/// finalization payload. Never holds the value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalProps {
    pub handle: Handle,
    pub native_handle: Option<NativeHandle>,
    pub native_pointer: Option<NativePointer>,
}

impl InternalProps {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            native_handle: None,
            native_pointer: None,
        }
    }

    pub fn has_native_attachment(&self) -> bool {
        self.native_handle.is_some() || self.native_pointer.is_some()
    }

    /// Copies native attachments from `previous` where this record has none.
    pub(crate) fn inherit_attachments(&mut self, previous: &InternalProps) {
        if self.native_handle.is_none() {
            self.native_handle = previous.native_handle;
        }
        if self.native_pointer.is_none() {
            self.native_pointer = previous.native_pointer;
        }
    }
}
