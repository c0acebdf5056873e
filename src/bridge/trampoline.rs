use std::rc::Rc;

use crate::{
    bridge::{
        Bridge,
        error::{BridgeError, BridgeResult},
        native::{ExternalCall, FunctionPtr},
    },
    handles::Handle,
    runtime::{
        host_function::{FunctionKind, HostFunction},
        value::HostValue,
    },
};

const HANDLE_WIDTH: usize = std::mem::size_of::<u32>();

/// Packed argument buffer handed to native code: one native-endian `u32`
/// per argument, in call order.
///
/// Allocated right before a native call and freed right after it.
#[derive(Debug)]
pub struct ArgBuffer {
    bytes: Vec<u8>,
}

impl ArgBuffer {
    pub fn pack(handles: &[Handle]) -> Self {
        let mut bytes = Vec::with_capacity(handles.len() * HANDLE_WIDTH);
        for handle in handles {
            bytes.extend_from_slice(&handle.raw().to_ne_bytes());
        }
        Self { bytes }
    }

    /// Number of argument handles.
    pub fn len(&self) -> usize {
        self.bytes.len() / HANDLE_WIDTH
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Start of the packed buffer, for native code indexing it positionally.
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    pub fn get(&self, index: usize) -> Option<Handle> {
        let start = index.checked_mul(HANDLE_WIDTH)?;
        let word = self.bytes.get(start..start + HANDLE_WIDTH)?;
        let mut raw = [0u8; HANDLE_WIDTH];
        raw.copy_from_slice(word);
        Some(Handle::from_raw(u32::from_ne_bytes(raw)))
    }

    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.bytes.chunks_exact(HANDLE_WIDTH).map(|word| {
            let mut raw = [0u8; HANDLE_WIDTH];
            raw.copy_from_slice(word);
            Handle::from_raw(u32::from_ne_bytes(raw))
        })
    }
}

impl Bridge {
    /// Wraps the native handler at `function_ptr` in a host function and
    /// returns an owned handle to it.
    pub fn create_external_function(&mut self, function_ptr: FunctionPtr) -> BridgeResult<Handle> {
        let function = HostValue::from_function(HostFunction::external(function_ptr));
        self.table.ref_value(&function)
    }

    /// Calls `function` from host code with receiver `this`.
    ///
    /// A thrown value, whether from a builtin or from a native handler that
    /// set the error flag on its result, comes back as
    /// [`BridgeError::Call`].
    pub fn call(
        &mut self,
        function: &HostValue,
        this: &HostValue,
        args: &[HostValue],
    ) -> BridgeResult<HostValue> {
        let callee = match function {
            HostValue::Function(callee) => Rc::clone(callee),
            other => {
                return Err(BridgeError::NotCallable {
                    type_name: other.type_name(),
                });
            }
        };

        let result = match callee.kind() {
            FunctionKind::Builtin(builtin) => {
                tracing::trace!("calling builtin {}", builtin.name);
                (builtin.func)(this, args).map_err(BridgeError::Call)
            }
            FunctionKind::External(external) => {
                self.invoke_external(external.function_ptr, function, this, args)
            }
        };
        self.process_finalizations();
        result
    }

    fn invoke_external(
        &mut self,
        function_ptr: FunctionPtr,
        function: &HostValue,
        this: &HostValue,
        args: &[HostValue],
    ) -> BridgeResult<HostValue> {
        let mut temporaries = Vec::with_capacity(args.len() + 2);
        if let Err(err) = self.ref_call_values(function, this, args, &mut temporaries) {
            // Release failures are logged by release_all.
            let _ = self.release_all(&temporaries);
            return Err(err);
        }

        let buffer = ArgBuffer::pack(&temporaries[2..]);
        let call = ExternalCall {
            function_ptr,
            function: temporaries[0],
            this: temporaries[1],
            args: &buffer,
        };
        tracing::trace!(
            "invoking external handler {:#x} with {} args",
            function_ptr,
            call.arg_count()
        );

        let native = Rc::clone(&self.native);
        let result = native.invoke_external_handler(self, &call);
        drop(buffer);

        let released = self.release_all(&temporaries);
        let outcome = self.take_result(result);
        released?;
        outcome
    }

    /// Extracts the value and error flag of a native result handle, then
    /// releases it.
    fn take_result(&mut self, result: Handle) -> BridgeResult<HostValue> {
        let value = self.table.resolve(result)?.clone();
        let has_error = self.table.has_error(result)?;
        self.table.release(result)?;

        if has_error {
            Err(BridgeError::Call(value))
        } else {
            Ok(value)
        }
    }

    /// References the callee, the receiver and each argument, in that order.
    fn ref_call_values(
        &mut self,
        function: &HostValue,
        this: &HostValue,
        args: &[HostValue],
        out: &mut Vec<Handle>,
    ) -> BridgeResult<()> {
        out.push(self.table.ref_value(function)?);
        out.push(self.table.ref_value(this)?);
        for arg in args {
            out.push(self.table.ref_value(arg)?);
        }
        Ok(())
    }

    /// Releases each handle once. Every release is attempted; the first
    /// failure is reported.
    fn release_all(&mut self, handles: &[Handle]) -> BridgeResult<()> {
        let mut first_error = None;
        for &handle in handles.iter().rev() {
            if let Err(err) = self.table.release(handle) {
                tracing::warn!("failed to release temporary handle {}: {}", handle, err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
