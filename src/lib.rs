//! Host-value bridge for a native VM.
//!
//! Native code refers to host values through integer [`Handle`]s. The
//! [`HandleTable`] keeps the two sides' reference counts in agreement, the
//! finalization queue tells native code once when a value it attached
//! resources to is reclaimed, and external functions route host calls back
//! into native handlers.
pub mod bridge;
pub mod finalization;
pub mod handles;
pub mod runtime;

pub use bridge::{
    Bridge,
    config::BridgeConfig,
    error::{BridgeError, BridgeResult},
    native::{ExternalCall, FunctionPtr, NativeRuntime},
    trampoline::ArgBuffer,
};
pub use finalization::{FinalizationMode, FreedObject};
pub use handles::{Handle, HandleTable, NativeHandle, NativePointer, TableStats};
pub use runtime::{
    host_function::HostFunction,
    object::{ErrorKind, HostObject},
    value::HostValue,
};
