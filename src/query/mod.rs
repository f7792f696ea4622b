//! Facilities for running SQL queries.
use super::{ffi, types::*, value::*, Connection};
pub use fallible_iterator::FallibleIterator;
use std::{
    ffi::{c_int, CStr},
    ops::Index,
    os::raw::c_char,
    ptr, slice, str,
};

mod test;

/// A prepared statement.
///
/// These can be created using methods such as [Connection::prepare].
pub struct Statement<'db> {
    base: *mut ffi::sqlite3_stmt,
    db: &'db Connection,
}

impl Connection {
    /// Prepare the first statement in `sql` for execution.
    ///
    /// Anything after the first statement is ignored. Fails if `sql` contains no statement.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        match self.prepare_next(sql)? {
            (Some(stmt), _) => Ok(stmt),
            (None, _) => Err(Error::Query {
                code: ffi::SQLITE_MISUSE,
                message: "no SQL statement to prepare".to_owned(),
            }),
        }
    }

    /// Prepare the first statement in `sql`, returning it along with the unprocessed
    /// remainder of the text. The statement is `None` if `sql` is only whitespace or
    /// comments.
    pub fn prepare_next<'a>(&self, sql: &'a str) -> Result<(Option<Statement<'_>>, &'a str)> {
        let len = c_int::try_from(sql.len()).map_err(|_| Error::Query {
            code: ffi::SQLITE_TOOBIG,
            message: ffi::errstr(ffi::SQLITE_TOOBIG),
        })?;
        let mut base: *mut ffi::sqlite3_stmt = ptr::null_mut();
        let mut tail: *const c_char = ptr::null();
        unsafe {
            Error::from_sqlite_desc(
                ffi::sqlite3_prepare_v2(
                    self.as_mut_ptr(),
                    sql.as_ptr() as *const c_char,
                    len,
                    &mut base,
                    &mut tail,
                ),
                self.as_mut_ptr(),
            )?;
        }
        let consumed = if tail.is_null() {
            sql.len()
        } else {
            tail as usize - sql.as_ptr() as usize
        };
        let stmt = (!base.is_null()).then(|| Statement { base, db: self });
        Ok((stmt, &sql[consumed..]))
    }

    /// Run every statement in `sql`, discarding any rows they return.
    pub fn execute(&self, sql: &str) -> Result<()> {
        self.for_each_statement(sql, |mut stmt| {
            while stmt.step()? {}
            Ok(())
        })
    }

    /// Prepare each statement in `sql` in turn and pass it to `f`. Stops at the first
    /// error.
    pub fn for_each_statement<F>(&self, sql: &str, mut f: F) -> Result<()>
    where
        F: FnMut(Statement<'_>) -> Result<()>,
    {
        let mut rest = sql;
        while !rest.trim().is_empty() {
            let (stmt, tail) = self.prepare_next(rest)?;
            if let Some(stmt) = stmt {
                f(stmt)?;
            } else if tail.len() == rest.len() {
                break;
            }
            rest = tail.trim_start();
        }
        Ok(())
    }
}

impl<'db> Statement<'db> {
    /// Return the underlying sqlite3_stmt pointer.
    pub fn as_ptr(&self) -> *mut ffi::sqlite3_stmt {
        self.base
    }

    /// Returns the original text of the prepared statement.
    pub fn sql(&self) -> Result<&str> {
        unsafe {
            let ret = ffi::sqlite3_sql(self.base);
            Ok(CStr::from_ptr(ret).to_str()?)
        }
    }

    /// Returns the number of columns in the result set returned by this query.
    pub fn column_count(&self) -> usize {
        unsafe { ffi::sqlite3_column_count(self.base) as _ }
    }

    /// Returns the value of the AS clause for the column, if one was specified. If no AS
    /// clause was specified, the name of the column is unspecified and may change from one
    /// release of SQLite to the next.
    pub fn column_name(&self, index: usize) -> Result<&str> {
        unsafe {
            let ret = ffi::sqlite3_column_name(self.base, index as _);
            if ret.is_null() {
                Err(Error::Query {
                    code: ffi::SQLITE_NOMEM,
                    message: ffi::errstr(ffi::SQLITE_NOMEM),
                })
            } else {
                Ok(CStr::from_ptr(ret).to_str()?)
            }
        }
    }

    /// Return an iterator over the result of the query.
    pub fn query(&mut self) -> Result<Rows<'_, 'db>> {
        unsafe { ffi::sqlite3_reset(self.base) };
        let columns = (0..self.column_count())
            .map(|i| self.column_name(i).map(String::from))
            .collect::<Result<Vec<_>>>()?;
        Ok(Rows {
            stmt: self,
            columns,
            finished: false,
        })
    }

    fn step(&mut self) -> Result<bool> {
        match unsafe { ffi::sqlite3_step(self.base) } {
            ffi::SQLITE_DONE => Ok(false),
            ffi::SQLITE_ROW => Ok(true),
            rc => unsafe { Error::from_sqlite_desc(rc, self.db.as_mut_ptr()) }.map(|_| false),
        }
    }

    /// Copy the value in column `index` of the current row.
    fn column_value(&self, index: usize) -> Result<Value> {
        let i = index as c_int;
        unsafe {
            Ok(match ValueType::from_sqlite(ffi::sqlite3_column_type(self.base, i)) {
                ValueType::Integer => Value::Integer(ffi::sqlite3_column_int64(self.base, i)),
                ValueType::Float => Value::Float(ffi::sqlite3_column_double(self.base, i)),
                ValueType::Text => {
                    let data = ffi::sqlite3_column_text(self.base, i);
                    let len = ffi::sqlite3_column_bytes(self.base, i);
                    let bytes = if data.is_null() {
                        &[][..]
                    } else {
                        slice::from_raw_parts(data as *const u8, len as _)
                    };
                    Value::Text(str::from_utf8(bytes)?.to_owned())
                }
                ValueType::Blob => {
                    let data = ffi::sqlite3_column_blob(self.base, i);
                    let len = ffi::sqlite3_column_bytes(self.base, i);
                    if data.is_null() {
                        Value::Blob(vec![])
                    } else {
                        Value::Blob(slice::from_raw_parts(data as *const u8, len as _).to_vec())
                    }
                }
                ValueType::Null => Value::Null,
            })
        }
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        unsafe { ffi::sqlite3_finalize(self.base) };
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Statement").field(&self.sql()).finish()
    }
}

/// An iterator of results for a [Statement].
///
/// Rows are produced in the order SQLite returns them.
pub struct Rows<'stmt, 'db> {
    stmt: &'stmt mut Statement<'db>,
    columns: Vec<String>,
    finished: bool,
}

impl Rows<'_, '_> {
    /// The names of the result columns, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl FallibleIterator for Rows<'_, '_> {
    type Item = Row;
    type Error = Error;

    fn next(&mut self) -> Result<Option<Row>> {
        if self.finished {
            // Stepping again would reset the statement and return its results again.
            return Ok(None);
        }
        match self.stmt.step() {
            Ok(true) => {
                let values = (0..self.columns.len())
                    .map(|i| self.stmt.column_value(i))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(Row {
                    columns: self.columns.iter().cloned().zip(values).collect(),
                }))
            }
            Ok(false) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }
}

/// One result record: an ordered mapping from column name to value.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Build a row from (column, value) pairs.
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Row { columns }
    }

    /// Returns the value of the first column with the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Discard the column names, keeping the values in order.
    pub fn into_values(self) -> Vec<Value> {
        self.columns.into_iter().map(|(_, v)| v).collect()
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.columns[index].1
    }
}
