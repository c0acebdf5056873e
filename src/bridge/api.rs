//! Native-facing value API: constructors, type predicates, typed accessors,
//! property access and host calls, all addressed by handle.
//!
//! Every `create_*` and every operation returning a `Handle` hands out an
//! owned handle that the caller must release.

use std::rc::Rc;

use crate::{
    bridge::{
        Bridge,
        error::{BridgeError, BridgeResult},
    },
    handles::Handle,
    runtime::{
        object::{ErrorKind, HostObject, ObjectClass},
        value::HostValue,
    },
};

impl Bridge {
    pub fn create_undefined(&mut self) -> BridgeResult<Handle> {
        self.table.ref_value(&HostValue::Undefined)
    }

    pub fn create_null(&mut self) -> BridgeResult<Handle> {
        self.table.ref_value(&HostValue::Null)
    }

    pub fn create_boolean(&mut self, value: bool) -> BridgeResult<Handle> {
        self.table.ref_value(&HostValue::Boolean(value))
    }

    pub fn create_number(&mut self, value: f64) -> BridgeResult<Handle> {
        self.table.ref_value(&HostValue::Number(value))
    }

    pub fn create_number_nan(&mut self) -> BridgeResult<Handle> {
        self.create_number(f64::NAN)
    }

    pub fn create_number_infinity(&mut self, negative: bool) -> BridgeResult<Handle> {
        let value = if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        self.create_number(value)
    }

    pub fn create_string(&mut self, text: &str) -> BridgeResult<Handle> {
        self.table.ref_value(&HostValue::string(text))
    }

    pub fn create_object(&mut self) -> BridgeResult<Handle> {
        self.table.ref_value(&HostValue::new_object())
    }

    /// Creates an array of length `len` whose elements are all holes.
    pub fn create_array(&mut self, len: u32) -> BridgeResult<Handle> {
        self.table
            .ref_value(&HostValue::from_object(HostObject::array(len)))
    }

    /// Creates an error object of `kind` and returns its handle with the
    /// error flag set.
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> BridgeResult<Handle> {
        let handle = self
            .table
            .ref_value(&HostValue::from_object(HostObject::error(kind, message)))?;
        self.table.set_error(handle, true)?;
        Ok(handle)
    }

    pub fn global_object(&mut self) -> BridgeResult<Handle> {
        let global = self.global.clone();
        self.table.ref_value(&global)
    }

    // -- Type predicates --

    pub fn is_undefined(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(matches!(self.resolve(handle)?, HostValue::Undefined))
    }

    pub fn is_null(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(matches!(self.resolve(handle)?, HostValue::Null))
    }

    pub fn is_boolean(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(matches!(self.resolve(handle)?, HostValue::Boolean(_)))
    }

    pub fn is_number(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(matches!(self.resolve(handle)?, HostValue::Number(_)))
    }

    pub fn is_string(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(matches!(self.resolve(handle)?, HostValue::String(_)))
    }

    /// Objects in the broad sense: plain objects, arrays, errors and
    /// functions.
    pub fn is_object(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(self.resolve(handle)?.is_reference())
    }

    pub fn is_function(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(matches!(self.resolve(handle)?, HostValue::Function(_)))
    }

    pub fn is_array(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(self
            .resolve(handle)?
            .as_object()
            .is_some_and(|object| object.is_array()))
    }

    pub fn is_error(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(self
            .resolve(handle)?
            .as_object()
            .is_some_and(|object| matches!(object.class(), ObjectClass::Error(_))))
    }

    // -- Typed accessors --

    pub fn boolean_value(&self, handle: Handle) -> BridgeResult<bool> {
        match self.resolve(handle)? {
            HostValue::Boolean(value) => Ok(*value),
            other => Err(type_mismatch("boolean", other)),
        }
    }

    pub fn number_value(&self, handle: Handle) -> BridgeResult<f64> {
        match self.resolve(handle)? {
            HostValue::Number(value) => Ok(*value),
            other => Err(type_mismatch("number", other)),
        }
    }

    pub fn string_value(&self, handle: Handle) -> BridgeResult<Rc<str>> {
        match self.resolve(handle)? {
            HostValue::String(value) => Ok(Rc::clone(value)),
            other => Err(type_mismatch("string", other)),
        }
    }

    pub fn array_length(&self, handle: Handle) -> BridgeResult<u32> {
        let array = self.array_of(handle)?;
        Ok(array.len())
    }

    // -- Properties --

    fn object_of(&self, handle: Handle) -> BridgeResult<Rc<HostObject>> {
        match self.resolve(handle)? {
            HostValue::Object(object) => Ok(Rc::clone(object)),
            other => Err(type_mismatch("object", other)),
        }
    }

    fn array_of(&self, handle: Handle) -> BridgeResult<Rc<HostObject>> {
        match self.resolve(handle)? {
            HostValue::Object(object) if object.is_array() => Ok(Rc::clone(object)),
            other => Err(type_mismatch("array", other)),
        }
    }

    /// Returns an owned handle to property `name`, `undefined` when missing.
    pub fn get_property(&mut self, object: Handle, name: &str) -> BridgeResult<Handle> {
        let value = self
            .object_of(object)?
            .get(name)
            .unwrap_or(HostValue::Undefined);
        self.table.ref_value(&value)
    }

    pub fn set_property(&mut self, object: Handle, name: &str, value: Handle) -> BridgeResult<()> {
        let target = self.object_of(object)?;
        let value = self.resolve(value)?.clone();
        target.set(name, value);
        self.process_finalizations();
        Ok(())
    }

    pub fn has_property(&self, object: Handle, name: &str) -> BridgeResult<bool> {
        Ok(self.object_of(object)?.has(name))
    }

    pub fn delete_property(&mut self, object: Handle, name: &str) -> BridgeResult<bool> {
        let target = self.object_of(object)?;
        let deleted = target.delete(name);
        self.process_finalizations();
        Ok(deleted)
    }

    pub fn get_index(&mut self, array: Handle, index: u32) -> BridgeResult<Handle> {
        let value = self.array_of(array)?.get_index(index);
        self.table.ref_value(&value)
    }

    /// Stores `value` at `index`. `u32::MAX` is rejected with
    /// [`BridgeError::InvalidIndex`] since the length could not hold it.
    pub fn set_index(&mut self, array: Handle, index: u32, value: Handle) -> BridgeResult<()> {
        let target = self.array_of(array)?;
        let value = self.resolve(value)?.clone();
        if !target.set_index(index, value) {
            return Err(BridgeError::InvalidIndex { index });
        }
        self.process_finalizations();
        Ok(())
    }

    /// Leaves a hole at `index`; returns whether an element was there.
    pub fn delete_index(&mut self, array: Handle, index: u32) -> BridgeResult<bool> {
        let target = self.array_of(array)?;
        let deleted = target.delete_index(index);
        self.process_finalizations();
        Ok(deleted)
    }

    /// Returns an owned handle to an array of the object's own property
    /// names: element indices first, then named properties in insertion
    /// order.
    pub fn object_keys(&mut self, object: Handle) -> BridgeResult<Handle> {
        let names = self
            .object_of(object)?
            .entries()
            .into_iter()
            .map(|(name, _)| HostValue::String(name));
        let array = HostObject::array_from(names);
        self.table.ref_value(&HostValue::from_object(array))
    }

    /// Visits every own property of `object` in the order of
    /// [`Self::object_keys`], over a snapshot taken before the first visit.
    ///
    /// `visit` receives borrowed name and value handles, valid only for the
    /// duration of the visit (acquire them to keep them). Returning `false`
    /// stops the iteration. Returns whether every property was visited.
    pub fn foreach_property<F>(&mut self, object: Handle, mut visit: F) -> BridgeResult<bool>
    where
        F: FnMut(&mut Bridge, Handle, Handle) -> bool,
    {
        let entries = self.object_of(object)?.entries();
        let mut completed = true;
        for (name, value) in entries {
            let name = self.table.ref_value(&HostValue::String(name))?;
            let value = match self.table.ref_value(&value) {
                Ok(value) => value,
                Err(err) => {
                    self.table.release(name)?;
                    return Err(err);
                }
            };

            let keep_going = visit(self, name, value);
            self.table.release(value)?;
            self.table.release(name)?;
            if !keep_going {
                completed = false;
                break;
            }
        }
        self.process_finalizations();
        Ok(completed)
    }

    // -- Conversions --

    /// Truthiness of the value; a value carrying the error flag is `false`.
    pub fn value_to_boolean(&self, handle: Handle) -> BridgeResult<bool> {
        if self.has_error(handle)? {
            return Ok(false);
        }
        Ok(self.resolve(handle)?.is_truthy())
    }

    /// Returns an owned handle to the number conversion of the value. A value
    /// carrying the error flag yields a flagged `TypeError`.
    pub fn value_to_number(&mut self, handle: Handle) -> BridgeResult<Handle> {
        if self.has_error(handle)? {
            return self.create_error(ErrorKind::Type, "cannot convert an error value");
        }
        let number = self.resolve(handle)?.to_number_value();
        self.create_number(number)
    }

    /// Returns an owned handle to the string conversion of the value. A value
    /// carrying the error flag yields a flagged `TypeError`.
    pub fn value_to_string(&mut self, handle: Handle) -> BridgeResult<Handle> {
        if self.has_error(handle)? {
            return self.create_error(ErrorKind::Type, "cannot convert an error value");
        }
        let text = self.resolve(handle)?.to_string_value();
        self.create_string(&text)
    }

    // -- Calls --

    /// Calls the function behind `function` on behalf of native code.
    ///
    /// Returns an owned result handle. A thrown value is returned as a handle
    /// with the error flag set; a callee that is not a function yields a
    /// flagged `TypeError`. Only handle failures are reported as `Err`.
    pub fn call_function(
        &mut self,
        function: Handle,
        this: Handle,
        args: &[Handle],
    ) -> BridgeResult<Handle> {
        let callee = self.resolve(function)?.clone();
        let receiver = self.resolve(this)?.clone();
        let values = self.resolve_all(args)?;

        let outcome = self.call(&callee, &receiver, &values);
        self.native_call_result(outcome, "is not a function")
    }

    /// Calls `function` as a constructor with a fresh plain object as the
    /// receiver.
    ///
    /// The result is the object the function returned, or the receiver when
    /// it returned a primitive. Throws and non-callable callees are reported
    /// as for [`Self::call_function`].
    pub fn construct_object(&mut self, function: Handle, args: &[Handle]) -> BridgeResult<Handle> {
        let callee = self.resolve(function)?.clone();
        let values = self.resolve_all(args)?;
        let receiver = HostValue::new_object();

        let outcome = self
            .call(&callee, &receiver, &values)
            .map(|result| if result.is_reference() { result } else { receiver });
        self.native_call_result(outcome, "is not a constructor")
    }

    fn resolve_all(&self, handles: &[Handle]) -> BridgeResult<Vec<HostValue>> {
        handles
            .iter()
            .map(|&handle| self.resolve(handle).cloned())
            .collect()
    }

    fn native_call_result(
        &mut self,
        outcome: BridgeResult<HostValue>,
        not_callable: &str,
    ) -> BridgeResult<Handle> {
        match outcome {
            Ok(value) => self.table.ref_value(&value),
            Err(BridgeError::Call(thrown)) => {
                let handle = self.table.ref_value(&thrown)?;
                self.table.set_error(handle, true)?;
                Ok(handle)
            }
            Err(BridgeError::NotCallable { type_name }) => {
                let message = format!("{} {}", type_name, not_callable);
                self.create_error(ErrorKind::Type, &message)
            }
            Err(err) => Err(err),
        }
    }
}

fn type_mismatch(expected: &'static str, found: &HostValue) -> BridgeError {
    BridgeError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}
