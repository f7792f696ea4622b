//! The greeting bundle: a minimal example of a bundle with more than one function.
use crate::{types::*, value::Value};

pub fn greet(args: &[Value]) -> Result<Value> {
    let name = args
        .first()
        .ok_or_else(|| Error::invalid_input("missing name argument"))?
        .as_text()?;
    Ok(Value::from(format!("Hello {}", name)))
}

/// Returns the version of this crate.
pub fn greeting_version(_: &[Value]) -> Result<Value> {
    Ok(Value::from(env!("CARGO_PKG_VERSION")))
}

pub(super) fn resolve(symbol: &str) -> Option<fn(&[Value]) -> Result<Value>> {
    Some(match symbol {
        "greet" => greet,
        "greeting_version" => greeting_version,
        _ => return None,
    })
}
