use super::super::{ffi, types::*, value::*};
use sealed::sealed;
use std::{
    ffi::{c_int, c_void},
    os::raw::c_char,
};

/// Describes the run-time environment of an application-defined function. The only thing a
/// function does with it is report its result.
#[repr(transparent)]
pub struct Context {
    base: ffi::sqlite3_context,
}

impl Context {
    pub(crate) unsafe fn from_ptr<'a>(base: *mut ffi::sqlite3_context) -> &'a mut Self {
        &mut *(base as *mut Self)
    }

    /// Return the underlying sqlite3_context pointer.
    pub fn as_ptr(&self) -> *mut ffi::sqlite3_context {
        &self.base as *const ffi::sqlite3_context as _
    }

    /// Set the result of the function call. SQLite copies text and blob results.
    pub fn set_result<T: ToContextResult>(&mut self, val: T) {
        val.assign_to(self);
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish()
    }
}

/// A type that can be returned from an SQL function.
#[sealed]
pub trait ToContextResult {
    #[doc(hidden)]
    fn assign_to(self, context: &mut Context);
}

macro_rules! to_context {
    ($ty:ty as ($ctx:ident, $val:ident) => $impl:expr) => {
        #[sealed]
        impl ToContextResult for $ty {
            fn assign_to(self, context: &mut Context) {
                let $ctx = context.as_ptr();
                let $val = self;
                unsafe { $impl }
            }
        }
    };
}

to_context!(() as (ctx, _val) => ffi::sqlite3_result_null(ctx));
to_context!(i64 as (ctx, val) => ffi::sqlite3_result_int64(ctx, val));
to_context!(f64 as (ctx, val) => ffi::sqlite3_result_double(ctx, val));
to_context!(&str as (ctx, val) => {
    ffi::sqlite3_result_text(
        ctx,
        val.as_ptr() as *const c_char,
        val.len() as c_int,
        ffi::SQLITE_TRANSIENT(),
    )
});
to_context!(&[u8] as (ctx, val) => {
    ffi::sqlite3_result_blob(
        ctx,
        val.as_ptr() as *const c_void,
        val.len() as c_int,
        ffi::SQLITE_TRANSIENT(),
    )
});
to_context!(&Error as (ctx, val) => ffi::result_error(ctx, &val.to_string()));

/// Sets the result to a dynamically typed [Value].
#[sealed]
impl ToContextResult for Value {
    fn assign_to(self, context: &mut Context) {
        match self {
            Value::Integer(x) => context.set_result(x),
            Value::Float(x) => context.set_result(x),
            Value::Text(x) => context.set_result(x.as_str()),
            Value::Blob(x) => context.set_result(x.as_slice()),
            Value::Null => context.set_result(()),
        }
    }
}
