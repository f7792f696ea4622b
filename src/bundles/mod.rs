//! Bundles whose implementations are compiled into this crate.
//!
//! [Builtins] is the [ImplementationSource] for the `builtin:` handles. The descriptors for
//! the built-in bundles are embedded as JSON and loaded the same way as descriptors read from
//! disk.
use crate::{extension::*, function::FunctionImpl, types::*};

pub mod greeting;
pub mod sam;
pub mod sequence;

const SEQUENCE: &str = "builtin:sequence";
const GREETING: &str = "builtin:greeting";
const SAM: &str = "builtin:sam";

/// Resolves the `builtin:sequence`, `builtin:sam` and `builtin:greeting` implementation
/// handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct Builtins;

impl Builtins {
    /// Descriptors for every built-in bundle.
    pub fn descriptors() -> Result<Vec<BundleDescriptor>> {
        [
            ("sequence.json", include_str!("sequence.json")),
            ("sam.json", include_str!("sam.json")),
            ("greeting.json", include_str!("greeting.json")),
        ]
        .into_iter()
        .map(|(origin, json)| BundleDescriptor::from_json(origin, json))
        .collect()
    }
}

impl ImplementationSource for Builtins {
    fn provides(&self, handle: &str) -> bool {
        matches!(handle, SEQUENCE | SAM | GREETING)
    }

    fn resolve(&self, handle: &str, symbol: &str) -> Option<FunctionImpl> {
        let func = match handle {
            SEQUENCE => sequence::resolve(symbol)?,
            SAM => sam::resolve(symbol)?,
            GREETING => greeting::resolve(symbol)?,
            _ => return None,
        };
        Some(Box::new(func))
    }
}
