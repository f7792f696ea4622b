#![allow(dead_code)]

use seqsql::{function::FunctionImpl, *};
use std::path::PathBuf;

/// Implementations for the descriptors under tests/data, under the handle `test:strings`.
pub struct Strings;

impl ImplementationSource for Strings {
    fn provides(&self, handle: &str) -> bool {
        handle == "test:strings"
    }

    fn resolve(&self, _handle: &str, symbol: &str) -> Option<FunctionImpl> {
        let func: FunctionImpl = match symbol {
            "upper" => Box::new(|args: &[Value]| {
                Ok(Value::from(args[0].as_text()?.to_uppercase()))
            }),
            "length" => Box::new(|args: &[Value]| {
                Ok(Value::Integer(args[0].as_text()?.chars().count() as i64))
            }),
            "now" => Box::new(|_: &[Value]| Ok(Value::Integer(1_700_000_000))),
            _ => return None,
        };
        Some(func)
    }
}

pub fn fixture(name: &str) -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "tests", "data", name]
        .iter()
        .collect()
}

pub fn setup() -> Result<QueryBridge> {
    connect(HostOptions::default())
}
