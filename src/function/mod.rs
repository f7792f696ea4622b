//! Function signatures and the engine's function-call hook.
use super::{ffi, types::*, value::*, Connection};
pub use context::*;
use serde::Deserialize;
use std::{
    ffi::{c_int, CString},
    fmt, slice,
};

mod context;

/// The declared kind of a parameter or return value.
///
/// Kinds are checked against the [ValueType] of each argument without any conversion, except
/// that [Kind::Number] accepts both integers and floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Integer,
    Float,
    Number,
    Text,
    Blob,
}

impl Kind {
    /// Returns true if a value of the given type may be passed where this kind is declared.
    pub fn accepts(self, ty: ValueType) -> bool {
        matches!(
            (self, ty),
            (Kind::Integer, ValueType::Integer)
                | (Kind::Float, ValueType::Float)
                | (Kind::Number, ValueType::Integer | ValueType::Float)
                | (Kind::Text, ValueType::Text)
                | (Kind::Blob, ValueType::Blob)
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::Number => "number",
            Kind::Text => "text",
            Kind::Blob => "blob",
        })
    }
}

/// The declared name, parameter kinds, and return kind of a scalar function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    name: String,
    params: Vec<Kind>,
    returns: Kind,
}

impl FunctionSignature {
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = Kind>,
        returns: Kind,
    ) -> Self {
        FunctionSignature {
            name: name.into(),
            params: params.into_iter().collect(),
            returns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Kind] {
        &self.params
    }

    pub fn returns(&self) -> Kind {
        self.returns
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, k) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", k)?;
        }
        write!(f, ") -> {}", self.returns)
    }
}

/// Options passed to SQLite when a function is installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FunctionOptions {
    deterministic: bool,
}

impl Default for FunctionOptions {
    fn default() -> Self {
        FunctionOptions {
            deterministic: true,
        }
    }
}

impl FunctionOptions {
    /// Deterministic functions always return the same result given the same inputs,
    /// which lets SQLite factor calls out of inner loops and use them in indexes.
    pub fn set_deterministic(mut self, val: bool) -> Self {
        self.deterministic = val;
        self
    }

    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    fn to_flags(self) -> c_int {
        let mut flags = ffi::SQLITE_UTF8;
        if self.deterministic {
            flags |= ffi::SQLITE_DETERMINISTIC;
        }
        flags
    }
}

/// The implementation of a scalar function.
///
/// Implementations receive arguments that have already been checked against the function's
/// [FunctionSignature], and must be pure.
pub trait ScalarFunction: Fn(&[Value]) -> Result<Value> + Send + Sync {}
impl<X: Fn(&[Value]) -> Result<Value> + Send + Sync> ScalarFunction for X {}

/// An owned, type-erased [ScalarFunction].
pub type FunctionImpl = Box<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

impl Connection {
    /// Create a new scalar function on this connection.
    ///
    /// The function is registered as variadic: SQLite passes however many arguments
    /// appeared in the query, and checking them is up to `func`. If `func` returns an
    /// error, the statement fails with the error's message.
    pub fn create_scalar_function<F>(&self, name: &str, opts: &FunctionOptions, func: F) -> Result<()>
    where
        F: Fn(&mut Context, &mut [&mut ValueRef]) -> Result<()> + 'static,
    {
        let name = CString::new(name)
            .map_err(|_| Error::invalid_input(format!("invalid function name {:?}", name)))?;
        let func = Box::new(func);
        unsafe {
            // SQLite invokes the destructor itself if this call fails.
            Error::from_sqlite_desc(
                ffi::sqlite3_create_function_v2(
                    self.as_mut_ptr(),
                    name.as_ptr(),
                    -1,
                    opts.to_flags(),
                    Box::into_raw(func) as _,
                    Some(call_scalar::<F>),
                    None,
                    None,
                    Some(ffi::drop_boxed::<F>),
                ),
                self.as_mut_ptr(),
            )
        }
    }
}

unsafe extern "C" fn call_scalar<F>(
    context: *mut ffi::sqlite3_context,
    argc: c_int,
    argv: *mut *mut ffi::sqlite3_value,
) where
    F: Fn(&mut Context, &mut [&mut ValueRef]) -> Result<()>,
{
    let func = &*(ffi::sqlite3_user_data(context) as *const F);
    let ctx = Context::from_ptr(context);
    let args = if argc == 0 || argv.is_null() {
        &mut [][..]
    } else {
        slice::from_raw_parts_mut(argv as *mut &mut ValueRef, argc as _)
    };
    if let Err(e) = func(&mut *ctx, args) {
        ctx.set_result(&e);
    }
}
