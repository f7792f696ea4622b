//! Raw SQLite bindings, and the small helpers that the safe wrappers share.
pub use libsqlite3_sys::*;
use std::{
    ffi::{c_int, c_void, CStr},
    os::raw::c_char,
};

/// Returns the English description of a result code, for errors raised before a
/// connection exists.
pub fn errstr(rc: c_int) -> String {
    unsafe { CStr::from_ptr(sqlite3_errstr(rc)) }
        .to_string_lossy()
        .into_owned()
}

/// Report an error from inside a function callback. SQLite copies the message.
///
/// # Safety
///
/// The context pointer must be the one passed to the currently running callback.
pub unsafe fn result_error(context: *mut sqlite3_context, msg: &str) {
    sqlite3_result_error(context, msg.as_ptr() as *const c_char, msg.len() as c_int);
}

pub unsafe extern "C" fn drop_boxed<T>(data: *mut c_void) {
    drop(Box::<T>::from_raw(data as *mut T));
}
