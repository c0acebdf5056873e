#![allow(dead_code)]

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use hostbridge::{Bridge, BridgeConfig, ExternalCall, FreedObject, FunctionPtr, Handle, NativeRuntime};

pub type Handler = fn(&mut Bridge, &ExternalCall<'_>) -> Handle;

/// What a handler observed about one trampoline call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub function_ptr: FunctionPtr,
    pub function: Handle,
    pub this: Handle,
    pub args: Vec<Handle>,
    /// Ref counts of function, receiver and each argument during the call.
    pub ref_counts: Vec<u32>,
}

/// In-process stand-in for the native VM: dispatches external calls to
/// registered handlers and records every freed-object notification.
#[derive(Default)]
pub struct RecordingNative {
    handlers: RefCell<HashMap<FunctionPtr, Handler>>,
    pub calls: RefCell<Vec<RecordedCall>>,
    pub freed: RefCell<Vec<FreedObject>>,
}

impl RecordingNative {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn handle(&self, function_ptr: FunctionPtr, handler: Handler) {
        self.handlers.borrow_mut().insert(function_ptr, handler);
    }

    pub fn freed_count(&self) -> usize {
        self.freed.borrow().len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls
            .borrow()
            .last()
            .cloned()
            .expect("no external call recorded")
    }
}

impl NativeRuntime for RecordingNative {
    fn invoke_external_handler(&self, bridge: &mut Bridge, call: &ExternalCall<'_>) -> Handle {
        let args: Vec<Handle> = call.args.iter().collect();
        let mut ref_counts = vec![
            bridge.ref_count(call.function).unwrap(),
            bridge.ref_count(call.this).unwrap(),
        ];
        for &arg in &args {
            ref_counts.push(bridge.ref_count(arg).unwrap());
        }
        self.calls.borrow_mut().push(RecordedCall {
            function_ptr: call.function_ptr,
            function: call.function,
            this: call.this,
            args,
            ref_counts,
        });

        let handler = *self
            .handlers
            .borrow()
            .get(&call.function_ptr)
            .expect("no handler registered for function pointer");
        handler(bridge, call)
    }

    fn notify_native_object_freed(&self, freed: &FreedObject) {
        self.freed.borrow_mut().push(freed.clone());
    }
}

pub fn bridge_with(native: &Rc<RecordingNative>) -> Bridge {
    Bridge::new(native.clone())
}

pub fn bridge_with_config(native: &Rc<RecordingNative>, config: BridgeConfig) -> Bridge {
    Bridge::with_config(config, native.clone())
}
