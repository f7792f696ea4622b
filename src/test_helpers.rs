#![cfg(test)]

use prelude::*;
use std::{cell::RefCell, rc::Rc};

pub mod prelude {
    pub use super::*;
    pub use crate::{function::*, query::*, types::*, value::*, *};
}

pub struct TestHelpers {
    pub db: Database,
}

impl TestHelpers {
    pub fn new() -> TestHelpers {
        let db = Database::open_in_memory().expect("failed to open database");
        TestHelpers { db }
    }

    /// Pass the result of the SQL expression `sql` to a function, and return what `func`
    /// made of it.
    pub fn with_value_from_sql<T, F>(&self, sql: &str, func: F) -> T
    where
        T: 'static,
        F: Fn(&mut ValueRef) -> Result<T> + 'static,
    {
        let out = Rc::new(RefCell::new(None));
        let slot = out.clone();
        let opts = FunctionOptions::default().set_deterministic(false);
        self.db
            .create_scalar_function("with_value", &opts, move |_, args| {
                *slot.borrow_mut() = Some(func(args[0])?);
                Ok(())
            })
            .unwrap();
        self.db
            .execute(&format!("SELECT with_value({})", sql))
            .unwrap();
        let ret = out.borrow_mut().take();
        ret.expect("with_value was not called")
    }
}

#[test]
fn with_value_from_sql() {
    let h = TestHelpers::new();
    let ty = h.with_value_from_sql("NULL", |val| Ok(val.value_type()));
    assert_eq!(ty, ValueType::Null);
    let s = h.with_value_from_sql("'input string'", |val| {
        Ok(val.get_str()?.map(String::from))
    });
    assert_eq!(s.as_deref(), Some("input string"));
}
