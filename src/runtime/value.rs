use std::{fmt, rc::Rc};

use crate::runtime::{
    host_function::HostFunction,
    object::{HostObject, ObjectClass},
    object_header::ObjectHeader,
};

/// Host-side value that native code refers to through handles.
///
/// ## Memory Management Model
///
/// Primitives (`Undefined`, `Null`, `Boolean`, `Number`, `String`) have value
/// semantics and no identity. Reference types (`Object`, `Function`) are shared
/// through `Rc` and carry an [`ObjectHeader`] with a stable identity; they are
/// reclaimed when the last strong reference is dropped.
///
/// ### No-Cycle Invariant
///
/// Values held in object properties must not form cycles. A cycle keeps every
/// member alive under reference counting, so its reclaim (and any native free
/// callback bound to it) would never happen.
#[derive(Debug, Clone)]
pub enum HostValue {
    /// The `undefined` value.
    Undefined,
    /// The `null` value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// IEEE-754 double.
    Number(f64),
    /// UTF-8 string value.
    String(Rc<str>),
    /// Plain object, array or error object.
    Object(Rc<HostObject>),
    /// Callable value.
    Function(Rc<HostFunction>),
}

impl HostValue {
    pub fn string(text: &str) -> Self {
        HostValue::String(text.into())
    }

    pub fn new_object() -> Self {
        HostValue::Object(Rc::new(HostObject::new(ObjectClass::Plain)))
    }

    pub fn from_object(object: HostObject) -> Self {
        HostValue::Object(Rc::new(object))
    }

    pub fn from_function(function: HostFunction) -> Self {
        HostValue::Function(Rc::new(function))
    }

    /// Returns the canonical type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "null",
            HostValue::Boolean(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Object(object) => match object.class() {
                ObjectClass::Plain => "object",
                ObjectClass::Array => "array",
                ObjectClass::Error(_) => "error",
            },
            HostValue::Function(_) => "function",
        }
    }

    /// Returns `true` for values that carry an identity and can hold native
    /// attachments.
    pub fn is_reference(&self) -> bool {
        matches!(self, HostValue::Object(_) | HostValue::Function(_))
    }

    /// Returns the object header of reference-type values.
    pub fn header(&self) -> Option<&ObjectHeader> {
        match self {
            HostValue::Object(object) => Some(object.header()),
            HostValue::Function(function) => Some(function.header()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<HostObject>> {
        match self {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<HostFunction>> {
        match self {
            HostValue::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Returns how the handle table recognises this value again: by object
    /// identity for reference types, by value for primitives.
    pub fn tracking_key(&self) -> TrackingKey<'_> {
        match self {
            HostValue::Object(object) => TrackingKey::Reference(object.header()),
            HostValue::Function(function) => TrackingKey::Reference(function.header()),
            HostValue::Undefined => TrackingKey::Primitive(PrimitiveKey::Undefined),
            HostValue::Null => TrackingKey::Primitive(PrimitiveKey::Null),
            HostValue::Boolean(v) => TrackingKey::Primitive(PrimitiveKey::Boolean(*v)),
            HostValue::Number(v) => TrackingKey::Primitive(PrimitiveKey::number(*v)),
            HostValue::String(v) => TrackingKey::Primitive(PrimitiveKey::String(Rc::clone(v))),
        }
    }

    /// Returns the lookup key for primitive values.
    pub fn primitive_key(&self) -> Option<PrimitiveKey> {
        match self.tracking_key() {
            TrackingKey::Primitive(key) => Some(key),
            TrackingKey::Reference(_) => None,
        }
    }

    /// Strict equality: reference types compare by identity, NaN is unequal
    /// to itself and `-0` equals `+0`.
    pub fn strict_equals(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::Undefined, HostValue::Undefined) => true,
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Boolean(a), HostValue::Boolean(b)) => a == b,
            (HostValue::Number(a), HostValue::Number(b)) => a == b,
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => Rc::ptr_eq(a, b),
            (HostValue::Function(a), HostValue::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Equality used to deduplicate handles: strict equality, except that NaN
    /// matches any other NaN.
    pub(crate) fn tracking_equals(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::Number(a), HostValue::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    /// Boolean conversion: `undefined`, `null`, `false`, `0`, `-0`, NaN and
    /// the empty string are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            HostValue::Undefined | HostValue::Null => false,
            HostValue::Boolean(v) => *v,
            HostValue::Number(v) => !(v.is_nan() || *v == 0.0),
            HostValue::String(v) => !v.is_empty(),
            HostValue::Object(_) | HostValue::Function(_) => true,
        }
    }

    /// String conversion, unquoted.
    ///
    /// Arrays join their elements with `,` (holes, `undefined` and `null`
    /// become empty). Arrays too sparse to list convert to `[object Array]`.
    pub fn to_string_value(&self) -> String {
        match self {
            HostValue::Undefined => "undefined".to_string(),
            HostValue::Null => "null".to_string(),
            HostValue::Boolean(v) => v.to_string(),
            HostValue::Number(v) => number_to_string(*v),
            HostValue::String(v) => v.to_string(),
            HostValue::Object(object) => match object.class() {
                ObjectClass::Plain => "[object Object]".to_string(),
                ObjectClass::Error(kind) => match object.get("message") {
                    Some(HostValue::String(message)) if !message.is_empty() => {
                        format!("{}: {}", kind, message)
                    }
                    _ => kind.name().to_string(),
                },
                ObjectClass::Array => match object.dense_elements() {
                    Some(elements) => elements
                        .iter()
                        .map(|element| match element {
                            HostValue::Undefined | HostValue::Null => String::new(),
                            other => other.to_string_value(),
                        })
                        .collect::<Vec<_>>()
                        .join(","),
                    None => "[object Array]".to_string(),
                },
            },
            HostValue::Function(_) => "function () { [native code] }".to_string(),
        }
    }

    /// Number conversion. Strings are parsed as decimal, `0x`/`0o`/`0b`
    /// integer or `Infinity` literals after trimming whitespace; objects go
    /// through their string conversion.
    pub fn to_number_value(&self) -> f64 {
        match self {
            HostValue::Undefined => f64::NAN,
            HostValue::Null => 0.0,
            HostValue::Boolean(v) => f64::from(u8::from(*v)),
            HostValue::Number(v) => *v,
            HostValue::String(v) => parse_number_text(v),
            HostValue::Object(_) | HostValue::Function(_) => {
                parse_number_text(&self.to_string_value())
            }
        }
    }
}

fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-Infinity" } else { "Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&value.abs()) {
        return value.to_string();
    }
    let text = format!("{:e}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => text,
    }
}

fn parse_number_text(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&text[2..], radix).map_or(f64::NAN, |v| v as f64);
    }

    // `str::parse` also accepts "inf" and "nan", which are not number literals.
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Boolean(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Number(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::string(value)
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "undefined"),
            HostValue::Null => write!(f, "null"),
            HostValue::Boolean(v) => write!(f, "{}", v),
            HostValue::Number(v) => f.write_str(&number_to_string(*v)),
            HostValue::String(v) => write!(f, "\"{}\"", v),
            HostValue::Object(object) => write!(f, "{}", object),
            HostValue::Function(function) => write!(f, "{}", function),
        }
    }
}

pub enum TrackingKey<'a> {
    Reference(&'a ObjectHeader),
    Primitive(PrimitiveKey),
}

/// Hashable key for primitive host values.
///
/// All NaN payloads collapse to one key and `-0` collapses to `+0`, so the key
/// agrees with [`HostValue::tracking_equals`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveKey {
    Undefined,
    Null,
    Boolean(bool),
    Number(u64),
    String(Rc<str>),
}

impl PrimitiveKey {
    fn number(value: f64) -> Self {
        let normalized = if value.is_nan() {
            f64::NAN
        } else if value == 0.0 {
            0.0
        } else {
            value
        };
        PrimitiveKey::Number(normalized.to_bits())
    }
}
