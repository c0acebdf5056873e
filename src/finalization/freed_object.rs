use crate::{
    handles::{Handle, InternalProps, NativeHandle, NativePointer},
    runtime::object_header::ObjectId,
};

/// One-shot payload describing a reclaimed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreedObject {
    pub object_id: ObjectId,
    /// Last handle of the value, or [`Handle::NULL`] when the value outlived
    /// a reset without being registered again.
    pub handle: Handle,
    pub native_handle: Option<NativeHandle>,
    pub native_pointer: Option<NativePointer>,
}

impl FreedObject {
    pub(crate) fn from_props(object_id: ObjectId, props: &InternalProps) -> Self {
        Self {
            object_id,
            handle: props.handle,
            native_handle: props.native_handle,
            native_pointer: props.native_pointer,
        }
    }

    /// Whether the handle number was invalidated by a reset before reclaim.
    pub fn is_stale(&self) -> bool {
        self.handle.is_null()
    }

    pub fn has_native_attachment(&self) -> bool {
        self.native_handle.is_some() || self.native_pointer.is_some()
    }

    /// Flattens the payload to the native callback argument order:
    /// `(native_info, native_ptr, free_cb, native_handle)`, 0 for absent.
    pub fn raw_parts(&self) -> (usize, usize, usize, usize) {
        let (native_info, native_ptr) = self
            .native_pointer
            .map_or((0, 0), |pointer| (pointer.info, pointer.ptr));
        let (free_cb, native_handle) = self
            .native_handle
            .map_or((0, 0), |handle| (handle.free_cb, handle.handle));
        (native_info, native_ptr, free_cb, native_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::object_header::ObjectHeader;

    #[test]
    fn test_raw_parts_orders_native_arguments() {
        let header = ObjectHeader::new();
        let mut props = InternalProps::new(Handle::from_raw(7));
        props.native_handle = Some(NativeHandle {
            handle: 0x10,
            free_cb: 0x20,
        });
        props.native_pointer = Some(NativePointer {
            ptr: 0x30,
            info: 0x40,
        });

        let freed = FreedObject::from_props(header.id(), &props);
        assert_eq!(freed.raw_parts(), (0x40, 0x30, 0x20, 0x10));
        assert!(freed.has_native_attachment());
    }

    #[test]
    fn test_raw_parts_zeroes_missing_attachments() {
        let header = ObjectHeader::new();
        let freed = FreedObject::from_props(header.id(), &InternalProps::new(Handle::from_raw(1)));
        assert_eq!(freed.raw_parts(), (0, 0, 0, 0));
        assert!(!freed.has_native_attachment());
    }
}
