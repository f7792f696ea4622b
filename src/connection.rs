use crate::{ffi, types::*};
use bitflags::bitflags;
use std::{
    ffi::{c_int, CString},
    ops::Deref,
    ptr,
};
use tracing::{debug, warn};

bitflags! {
    /// Flags controlling how [Database::open] opens a database.
    pub struct OpenFlags: c_int {
        const READ_ONLY = ffi::SQLITE_OPEN_READONLY;
        const READ_WRITE = ffi::SQLITE_OPEN_READWRITE;
        const CREATE = ffi::SQLITE_OPEN_CREATE;
        const URI = ffi::SQLITE_OPEN_URI;
        const NO_MUTEX = ffi::SQLITE_OPEN_NOMUTEX;
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        OpenFlags::READ_WRITE | OpenFlags::CREATE | OpenFlags::URI
    }
}

/// Represents a borrowed connection to an SQLite database.
#[repr(transparent)]
pub struct Connection {
    db: ffi::sqlite3,
}

impl Connection {
    /// Convert an SQLite handle into a reference to Connection.
    ///
    /// # Safety
    ///
    /// The behavior of this method is undefined if the passed pointer is not valid.
    pub unsafe fn from_ptr<'a>(db: *mut ffi::sqlite3) -> &'a mut Connection {
        &mut *(db as *mut Connection)
    }

    /// Borrow the connection underlying a [rusqlite::Connection].
    ///
    /// Functions created through the returned reference live as long as the rusqlite
    /// connection does.
    #[cfg(feature = "with_rusqlite")]
    #[cfg_attr(docsrs, doc(cfg(feature = "with_rusqlite")))]
    pub fn from_rusqlite(conn: &rusqlite::Connection) -> &Connection {
        unsafe { Connection::from_ptr(conn.handle()) }
    }

    /// Get the underlying SQLite handle.
    ///
    /// # Safety
    ///
    /// Using the returned pointer may cause undefined behavior in other, safe code.
    pub unsafe fn as_mut_ptr(&self) -> *mut ffi::sqlite3 {
        &self.db as *const _ as _
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Represents an owned connection to an SQLite database.
///
/// This struct is an owned version of [Connection]. When this struct is dropped, it will close
/// the underlying connection to SQLite.
pub struct Database {
    db: *mut ffi::sqlite3,
}

impl Database {
    pub fn open_in_memory() -> Result<Database> {
        Database::open(":memory:", OpenFlags::default())
    }

    /// Open the database at `path`, which may be a filename, `:memory:`, or (when
    /// [OpenFlags::URI] is set) a `file:` URI.
    pub fn open(path: &str, flags: OpenFlags) -> Result<Database> {
        let c_path = CString::new(path).map_err(|_| Error::Query {
            code: ffi::SQLITE_CANTOPEN,
            message: format!("invalid database path {:?}", path),
        })?;
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        unsafe {
            let rc = ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags.bits(), ptr::null());
            if let Err(e) = Error::from_sqlite_desc(rc, db) {
                // SQLite allocates a handle even when opening fails.
                if !db.is_null() {
                    ffi::sqlite3_close(db);
                }
                return Err(e);
            }
        }
        debug!(path, ?flags, "opened database");
        Ok(Database { db })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let rc = unsafe { ffi::sqlite3_close_v2(self.db) };
        if rc != ffi::SQLITE_OK {
            warn!(code = rc, "error while closing SQLite connection");
        }
    }
}

impl Deref for Database {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        unsafe { Connection::from_ptr(self.db) }
    }
}
