use std::{cell::RefCell, rc::Rc};

use crate::{
    handles::{handle::Handle, internal_props::InternalProps},
    runtime::value::HostValue,
};

/// Table record for one live handle.
///
/// The entry owns a strong reference to `value`, which keeps the value alive
/// for as long as native code holds the handle.
#[derive(Debug)]
pub struct Entry {
    pub(crate) handle: Handle,
    pub(crate) value: HostValue,
    pub(crate) ref_count: u32,
    pub(crate) error: bool,
    /// Shared back-reference props; `None` for primitives.
    pub(crate) props: Option<Rc<RefCell<InternalProps>>>,
}

impl Entry {
    pub(crate) fn new(
        handle: Handle,
        value: HostValue,
        props: Option<Rc<RefCell<InternalProps>>>,
    ) -> Self {
        Self {
            handle,
            value,
            ref_count: 1,
            error: false,
            props,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn value(&self) -> &HostValue {
        &self.value
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Only entries of reference-type values are ever removed from the table.
    pub fn is_removable(&self) -> bool {
        self.props.is_some()
    }
}
