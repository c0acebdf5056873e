use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    finalization::{FinalizationQueue, FreedObject},
    handles::InternalProps,
    runtime::object_header::ObjectId,
};

/// One-shot reclaim observer stored in an object header.
#[derive(Debug)]
pub struct ReclaimWatch {
    props: Rc<RefCell<InternalProps>>,
    queue: Weak<FinalizationQueue>,
}

impl ReclaimWatch {
    pub(crate) fn new(props: Rc<RefCell<InternalProps>>, queue: &Rc<FinalizationQueue>) -> Self {
        Self {
            props,
            queue: Rc::downgrade(queue),
        }
    }

    pub(crate) fn props(&self) -> &Rc<RefCell<InternalProps>> {
        &self.props
    }

    /// Consumes the watch. A queue that is already gone means the owning
    /// table was dropped, and there is nobody left to notify.
    pub(crate) fn fire(self, object_id: ObjectId) {
        if let Some(queue) = self.queue.upgrade() {
            let freed = FreedObject::from_props(object_id, &self.props.borrow());
            queue.push(freed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{handles::Handle, runtime::value::HostValue};

    #[test]
    fn test_drop_of_last_reference_queues_once() {
        let queue = Rc::new(FinalizationQueue::new());
        let value = HostValue::new_object();
        let props = Rc::new(RefCell::new(InternalProps::new(Handle::from_raw(3))));
        let header = value.header().expect("object has a header");
        assert!(header.install_watch(ReclaimWatch::new(props, &queue)).is_none());

        let host_copy = value.clone();
        drop(value);
        assert!(queue.is_empty());

        drop(host_copy);
        assert_eq!(queue.len(), 1);
        let freed = queue.pop().expect("queued");
        assert_eq!(freed.handle, Handle::from_raw(3));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_dropped_queue_swallows_reclaim() {
        let queue = Rc::new(FinalizationQueue::new());
        let value = HostValue::new_object();
        let props = Rc::new(RefCell::new(InternalProps::new(Handle::from_raw(1))));
        value
            .header()
            .expect("object has a header")
            .install_watch(ReclaimWatch::new(props, &queue));

        drop(queue);
        drop(value);
    }
}
