//! Host value model.
//!
//! # No-Cycle Invariant
//! Reference-type host values are shared through `Rc`, and their reclaim is
//! what drives finalization. Object graphs must therefore stay acyclic:
//! - properties and array elements must not point back at a containing object;
//! - any feature that needs cyclic data must use cycle-aware management.
//!
//! A cycle would keep its members alive forever and their native free
//! callbacks would never run.
use crate::runtime::value::HostValue;

pub mod host_function;
pub mod object;
pub mod object_header;
pub mod value;

pub type HostFn = fn(&HostValue, &[HostValue]) -> Result<HostValue, HostValue>;
