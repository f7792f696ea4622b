use super::{ffi, types::*};
use std::{ffi::c_int, fmt, marker::PhantomData, slice, str};


#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ValueType {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

impl ValueType {
    pub(crate) fn from_sqlite(val: c_int) -> ValueType {
        match val {
            ffi::SQLITE_INTEGER => ValueType::Integer,
            ffi::SQLITE_FLOAT => ValueType::Float,
            ffi::SQLITE_TEXT => ValueType::Text,
            ffi::SQLITE_BLOB => ValueType::Blob,
            ffi::SQLITE_NULL => ValueType::Null,
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Integer => "INTEGER",
            ValueType::Float => "FLOAT",
            ValueType::Text => "TEXT",
            ValueType::Blob => "BLOB",
            ValueType::Null => "NULL",
        })
    }
}

/// Stores an SQLite-compatible value owned by Rust code.
///
/// This is the currency of the function registry: arguments are passed to implementations as
/// a slice of Values, and implementations return one.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
            Value::Blob(_) => ValueType::Blob,
            Value::Null => ValueType::Null,
        }
    }

    /// Convenience method equivalent to `self.value_type() == ValueType::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the contents of a TEXT value.
    ///
    /// Fails with [Error::InvalidInput] for any other type; no conversion is attempted.
    pub fn as_text(&self) -> Result<&str> {
        match self {
            Value::Text(s) => Ok(s),
            x => Err(Error::invalid_input(format!(
                "expected TEXT, found {}",
                x.value_type()
            ))),
        }
    }

    /// Interpret an INTEGER or FLOAT value as f64.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Integer(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            x => Err(Error::invalid_input(format!(
                "expected a number, found {}",
                x.value_type()
            ))),
        }
    }
}

macro_rules! value_from {
    ($ty:ty as ($x:ident) => $impl:expr) => {
        impl From<$ty> for Value {
            fn from($x: $ty) -> Value {
                $impl
            }
        }
    };
}

value_from!(i32 as (x) => Value::Integer(x as _));
value_from!(i64 as (x) => Value::Integer(x));
value_from!(f32 as (x) => Value::Float(x as _));
value_from!(f64 as (x) => Value::Float(x));
value_from!(&str as (x) => Value::Text(x.to_owned()));
value_from!(String as (x) => Value::Text(x));
value_from!(Vec<u8> as (x) => Value::Blob(x));
value_from!(() as (_x) => Value::Null);

/// Stores a protected SQL value, borrowed from SQLite for the duration of a function call.
/// SQLite always owns all value objects, so there is no way to directly create one.
#[repr(transparent)]
pub struct ValueRef {
    base: ffi::sqlite3_value,
    // Values are not safe to send between threads.
    phantom: PhantomData<*const ffi::sqlite3_value>,
}

impl ValueRef {
    /// Get the underlying SQLite handle.
    ///
    /// # Safety
    ///
    /// Invoking SQLite methods on the returned value may invalidate existing references
    /// previously returned by this object.
    pub unsafe fn as_ptr(&self) -> *mut ffi::sqlite3_value {
        &self.base as *const ffi::sqlite3_value as _
    }

    pub fn value_type(&self) -> ValueType {
        unsafe { ValueType::from_sqlite(ffi::sqlite3_value_type(self.as_ptr())) }
    }

    pub fn get_i64(&self) -> i64 {
        unsafe { ffi::sqlite3_value_int64(self.as_ptr()) }
    }

    pub fn get_f64(&self) -> f64 {
        unsafe { ffi::sqlite3_value_double(self.as_ptr()) }
    }

    /// Interpret this value as a BLOB. The returned value is `None` if the underlying
    /// value is SQL NULL.
    pub fn get_blob(&mut self) -> Result<Option<&[u8]>> {
        unsafe {
            let data = ffi::sqlite3_value_blob(self.as_ptr());
            let len = ffi::sqlite3_value_bytes(self.as_ptr());
            if data.is_null() {
                match self.value_type() {
                    ValueType::Null => Ok(None),
                    // Zero-length values have no buffer.
                    _ if len == 0 => Ok(Some(&[][..])),
                    _ => Err(Error::Query {
                        code: ffi::SQLITE_NOMEM,
                        message: ffi::errstr(ffi::SQLITE_NOMEM),
                    }),
                }
            } else {
                Ok(Some(slice::from_raw_parts(data as *const u8, len as _)))
            }
        }
    }

    /// Interpret the value as `Option<&str>`.
    ///
    /// This method will fail if the value has invalid UTF-8.
    pub fn get_str(&mut self) -> Result<Option<&str>> {
        Ok(self.get_blob()?.map(str::from_utf8).transpose()?)
    }

    /// Copy the referenced value into an owned [Value], keeping its storage class.
    pub fn to_owned(&mut self) -> Result<Value> {
        Ok(match self.value_type() {
            ValueType::Integer => Value::Integer(self.get_i64()),
            ValueType::Float => Value::Float(self.get_f64()),
            ValueType::Text => Value::Text(self.get_str()?.unwrap_or_default().to_owned()),
            ValueType::Blob => Value::Blob(self.get_blob()?.unwrap_or_default().to_vec()),
            ValueType::Null => Value::Null,
        })
    }
}

impl fmt::Debug for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type() {
            ValueType::Integer => f.debug_tuple("Integer").field(&self.get_i64()).finish(),
            ValueType::Float => f.debug_tuple("Float").field(&self.get_f64()).finish(),
            ValueType::Text => f.write_str("Text(..)"),
            ValueType::Blob => f.write_str("Blob(..)"),
            ValueType::Null => f.debug_tuple("Null").finish(),
        }
    }
}
