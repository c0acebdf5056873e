use std::fmt;

use crate::{
    bridge::native::FunctionPtr,
    runtime::{HostFn, object_header::ObjectHeader},
};

/// Host-defined callable: receives the receiver and the positional arguments,
/// returns the call result or the value it throws.
#[derive(Clone, Copy)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub func: HostFn,
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinFunction({})", self.name)
    }
}

/// Trampoline target: the native function pointer a host call is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalFunction {
    pub function_ptr: FunctionPtr,
}

#[derive(Debug, Clone, Copy)]
pub enum FunctionKind {
    Builtin(BuiltinFunction),
    External(ExternalFunction),
}

/// Callable reference-type host value.
#[derive(Debug)]
pub struct HostFunction {
    header: ObjectHeader,
    kind: FunctionKind,
}

impl HostFunction {
    pub fn builtin(name: &'static str, func: HostFn) -> Self {
        Self {
            header: ObjectHeader::new(),
            kind: FunctionKind::Builtin(BuiltinFunction { name, func }),
        }
    }

    pub fn external(function_ptr: FunctionPtr) -> Self {
        Self {
            header: ObjectHeader::new(),
            kind: FunctionKind::External(ExternalFunction { function_ptr }),
        }
    }

    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }
}

impl fmt::Display for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FunctionKind::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            FunctionKind::External(external) => {
                write!(f, "<external {:#x}>", external.function_ptr)
            }
        }
    }
}
