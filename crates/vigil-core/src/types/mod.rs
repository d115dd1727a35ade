//! Type system for vigil
//!
//! Facts, settings and expression results all share the `Value` type.

pub mod value;

pub use value::Value;
