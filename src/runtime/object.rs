use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fmt,
    rc::Rc,
};

use crate::runtime::{object_header::ObjectHeader, value::HostValue};

/// Error constructor families a native engine can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Common,
    Eval,
    Range,
    Reference,
    Syntax,
    Type,
    Uri,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Common => "Error",
            ErrorKind::Eval => "EvalError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Uri => "URIError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Plain,
    Array,
    Error(ErrorKind),
}

/// Largest array length. The largest element index is one less.
pub const MAX_ARRAY_LENGTH: u32 = u32::MAX;

/// Reference-type host value with named properties and, for arrays, indexed
/// elements.
///
/// Properties keep insertion order. Elements are stored sparsely, so a length
/// never implies an allocation. Interior mutability lets several handles and
/// host references share one object.
#[derive(Debug)]
pub struct HostObject {
    header: ObjectHeader,
    class: ObjectClass,
    properties: RefCell<Vec<(Rc<str>, HostValue)>>,
    elements: RefCell<BTreeMap<u32, HostValue>>,
    length: Cell<u32>,
}

impl HostObject {
    pub fn new(class: ObjectClass) -> Self {
        Self {
            header: ObjectHeader::new(),
            class,
            properties: RefCell::new(Vec::new()),
            elements: RefCell::new(BTreeMap::new()),
            length: Cell::new(0),
        }
    }

    /// Creates an array of length `len` whose elements are all holes.
    pub fn array(len: u32) -> Self {
        let object = Self::new(ObjectClass::Array);
        object.length.set(len);
        object
    }

    /// Creates a dense array holding `values` in order. Values past
    /// [`MAX_ARRAY_LENGTH`] are dropped.
    pub fn array_from(values: impl IntoIterator<Item = HostValue>) -> Self {
        let object = Self::array(0);
        for (index, value) in (0..MAX_ARRAY_LENGTH).zip(values) {
            object.set_index(index, value);
        }
        object
    }

    /// Creates an error object whose `message` property holds `message`.
    pub fn error(kind: ErrorKind, message: &str) -> Self {
        let object = Self::new(ObjectClass::Error(kind));
        object.set("message", HostValue::string(message));
        object
    }

    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    pub fn class(&self) -> ObjectClass {
        self.class
    }

    pub fn is_array(&self) -> bool {
        self.class == ObjectClass::Array
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.class {
            ObjectClass::Error(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<HostValue> {
        self.properties
            .borrow()
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value.clone())
    }

    pub fn has(&self, name: &str) -> bool {
        self.properties
            .borrow()
            .iter()
            .any(|(key, _)| key.as_ref() == name)
    }

    /// Sets `name` to `value`, keeping the original position of an existing key.
    pub fn set(&self, name: &str, value: HostValue) {
        let mut properties = self.properties.borrow_mut();
        match properties.iter_mut().find(|(key, _)| key.as_ref() == name) {
            Some((_, slot)) => *slot = value,
            None => properties.push((name.into(), value)),
        }
    }

    /// Removes `name`; returns whether the property existed.
    pub fn delete(&self, name: &str) -> bool {
        let mut properties = self.properties.borrow_mut();
        let before = properties.len();
        properties.retain(|(key, _)| key.as_ref() != name);
        properties.len() != before
    }

    pub fn keys(&self) -> Vec<Rc<str>> {
        self.properties
            .borrow()
            .iter()
            .map(|(key, _)| Rc::clone(key))
            .collect()
    }

    pub fn len(&self) -> u32 {
        self.length.get()
    }

    pub fn is_empty(&self) -> bool {
        self.length.get() == 0
    }

    /// Returns the element at `index`, `undefined` for holes.
    pub fn get_index(&self, index: u32) -> HostValue {
        self.elements
            .borrow()
            .get(&index)
            .cloned()
            .unwrap_or(HostValue::Undefined)
    }

    /// Stores `value` at `index`, growing the length past it.
    ///
    /// Returns `false` and leaves the object untouched when `index` is not a
    /// valid element index (the length would exceed [`MAX_ARRAY_LENGTH`]).
    pub fn set_index(&self, index: u32, value: HostValue) -> bool {
        let Some(min_length) = index.checked_add(1) else {
            return false;
        };
        self.elements.borrow_mut().insert(index, value);
        if min_length > self.length.get() {
            self.length.set(min_length);
        }
        true
    }

    /// Turns the element at `index` into a hole; the length is unchanged.
    /// Returns whether an element was present.
    pub fn delete_index(&self, index: u32) -> bool {
        let removed = self.elements.borrow_mut().remove(&index);
        removed.is_some()
    }

    /// Snapshot of every own property in enumeration order: present elements
    /// by ascending index (named by their decimal index), then named
    /// properties in insertion order.
    pub fn entries(&self) -> Vec<(Rc<str>, HostValue)> {
        let mut entries: Vec<(Rc<str>, HostValue)> = self
            .elements
            .borrow()
            .iter()
            .map(|(index, value)| (Rc::from(index.to_string()), value.clone()))
            .collect();
        entries.extend(
            self.properties
                .borrow()
                .iter()
                .map(|(key, value)| (Rc::clone(key), value.clone())),
        );
        entries
    }

    /// Element values with holes as `undefined`, or `None` when the array is
    /// too sparse to list.
    pub(crate) fn dense_elements(&self) -> Option<Vec<HostValue>> {
        let elements = self.elements.borrow();
        if self.length.get() as usize > elements.len() + DISPLAY_HOLE_LIMIT {
            return None;
        }
        Some(
            (0..self.length.get())
                .map(|index| elements.get(&index).cloned().unwrap_or(HostValue::Undefined))
                .collect(),
        )
    }
}

const DISPLAY_HOLE_LIMIT: usize = 64;

impl fmt::Display for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            ObjectClass::Array => match self.dense_elements() {
                Some(elements) => {
                    let items: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                    write!(f, "[{}]", items.join(", "))
                }
                None => write!(f, "<array length {}>", self.len()),
            },
            ObjectClass::Error(kind) => match self.get("message") {
                Some(HostValue::String(message)) => write!(f, "{}: {}", kind, message),
                _ => write!(f, "{}", kind),
            },
            ObjectClass::Plain => {
                let items: Vec<String> = self
                    .properties
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }
        }
    }
}
