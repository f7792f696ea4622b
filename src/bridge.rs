//! Runs query text on the engine, with the registry's functions callable from SQL.
use crate::{
    connection::{Connection, Database},
    function::Context,
    query::{FallibleIterator, Row},
    registry::Registry,
    types::*,
    value::{ValueRef, ValueType},
};
use std::{cell::Cell, path::Path, rc::Rc, sync::Arc};
use tracing::{debug, instrument, warn};

/// Where the last call to [QueryBridge::run] got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No query has been run yet.
    Idle,
    /// The engine is parsing a statement.
    Parsing,
    /// A statement was prepared and handed to the engine for execution.
    Forwarded,
    /// The engine has produced at least one row of the current statement.
    RowStreaming,
    /// Every statement ran to completion.
    Done,
    /// The engine or a function call failed. No statement is retried.
    Failed,
}

/// Holds the typed error of a failed function call until the engine reports the failure.
///
/// The engine only sees the error message. The bridge uses this to surface the original
/// [Error] instead of the engine's generic one.
#[derive(Clone, Default)]
struct ErrorSlot(Rc<Cell<Option<Error>>>);

impl ErrorSlot {
    fn put(&self, err: Error) {
        self.0.set(Some(err));
    }

    fn take(&self) -> Option<Error> {
        self.0.take()
    }
}

/// Install every function in `registry` into a connection which is owned elsewhere.
///
/// Calls from SQL are evaluated with an [Evaluator](crate::Evaluator). A failed call fails
/// the statement with the error's message. A call with the declared number of arguments
/// returns NULL if any of them is NULL, without calling the function.
pub fn install(conn: &Connection, registry: Arc<Registry>) -> Result<()> {
    install_functions(conn, &registry, None)
}

fn install_functions(
    conn: &Connection,
    registry: &Arc<Registry>,
    errors: Option<&ErrorSlot>,
) -> Result<()> {
    for func in registry.iter() {
        let name = func.signature().name().to_owned();
        let arity = func.signature().arity();
        let registry = registry.clone();
        let errors = errors.cloned();
        conn.create_scalar_function(
            func.signature().name(),
            func.options(),
            move |ctx: &mut Context, args: &mut [&mut ValueRef]| {
                if args.len() == arity && args.iter().any(|a| a.value_type() == ValueType::Null) {
                    ctx.set_result(());
                    return Ok(());
                }
                let ret = args
                    .iter_mut()
                    .map(|a| ValueRef::to_owned(a))
                    .collect::<Result<Vec<_>>>()
                    .and_then(|args| registry.evaluator().evaluate(&name, &args));
                match ret {
                    Ok(ret) => ctx.set_result(ret),
                    Err(e) => {
                        ctx.set_result(&e);
                        if let Some(errors) = &errors {
                            errors.put(e);
                        }
                    }
                }
                Ok(())
            },
        )?;
    }
    debug!(functions = registry.len(), "installed functions");
    Ok(())
}

/// A database connection with a registry's functions installed.
///
/// One query runs at a time on a bridge. Open one bridge per thread to run queries
/// concurrently; they can all share the same registry.
pub struct QueryBridge {
    db: Database,
    registry: Arc<Registry>,
    errors: ErrorSlot,
    state: BridgeState,
}

impl QueryBridge {
    pub fn new(db: Database, registry: Arc<Registry>) -> Result<Self> {
        let errors = ErrorSlot::default();
        install_functions(&db, &registry, Some(&errors))?;
        Ok(QueryBridge {
            db,
            registry,
            errors,
            state: BridgeState::Idle,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Run every statement in `sql` and collect the rows they return, in the order the
    /// engine produced them.
    pub fn run(&mut self, sql: &str) -> Result<Vec<Row>> {
        let mut rows = vec![];
        self.for_each(sql, |row| {
            rows.push(row);
            Ok(())
        })?;
        Ok(rows)
    }

    /// Run every statement in `sql`, passing each row to `callback` as it is produced.
    ///
    /// Stops at the first error, whether it comes from the engine, from a function call,
    /// or from `callback`.
    #[instrument(name = "bridge::run", level = "trace", skip(self, callback))]
    pub fn for_each<F>(&mut self, sql: &str, mut callback: F) -> Result<()>
    where
        F: FnMut(Row) -> Result<()>,
    {
        self.errors.take();
        self.state = BridgeState::Parsing;
        let state = &mut self.state;
        let ret = self.db.for_each_statement(sql, |mut stmt| {
            *state = BridgeState::Forwarded;
            let mut rows = stmt.query()?;
            while let Some(row) = rows.next()? {
                *state = BridgeState::RowStreaming;
                callback(row)?;
            }
            *state = BridgeState::Parsing;
            Ok(())
        });
        match ret {
            Ok(()) => {
                self.state = BridgeState::Done;
                Ok(())
            }
            Err(e) => {
                self.state = BridgeState::Failed;
                let e = match e {
                    Error::Query { .. } => self.errors.take().unwrap_or(e),
                    e => e,
                };
                warn!(error = %e, "query failed");
                Err(e)
            }
        }
    }

    /// Read a file of SQL, fill in its placeholders from `vars`, and run the result.
    ///
    /// Placeholders are `$key` or `${key}`, where `key` is an ASCII identifier, and `$$`
    /// stands for a single `$`. With no `vars` the file is run as written.
    pub fn run_file(&mut self, path: impl AsRef<Path>, vars: &[(&str, &str)]) -> Result<Vec<Row>> {
        let text = std::fs::read_to_string(path)?;
        if vars.is_empty() {
            return self.run(&text);
        }
        let sql = substitute(&text, vars)?;
        self.run(&sql)
    }
}

impl std::fmt::Debug for QueryBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBridge")
            .field("functions", &self.registry.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Length of the ASCII identifier at the start of `s`, or 0 if there is none.
fn identifier_len(s: &str) -> usize {
    match s.bytes().next() {
        Some(b) if b == b'_' || b.is_ascii_alphabetic() => s
            .bytes()
            .take_while(|b| *b == b'_' || b.is_ascii_alphanumeric())
            .count(),
        _ => 0,
    }
}

fn invalid_placeholder(template: &str, offset: usize) -> Error {
    let before = &template[..offset];
    Error::InvalidPlaceholder {
        line: before.matches('\n').count() + 1,
        column: offset - before.rfind('\n').map_or(0, |i| i + 1) + 1,
    }
}

/// Replace each `$key` and `${key}` in `template`, and each `$$` with `$`.
fn substitute(template: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut ret = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('$') {
        let offset = template.len() - rest.len() + start;
        ret.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let (key, len) = if after.starts_with('$') {
            ret.push('$');
            rest = &after[1..];
            continue;
        } else if let Some(braced) = after.strip_prefix('{') {
            let len = identifier_len(braced);
            if len == 0 || !braced[len..].starts_with('}') {
                return Err(invalid_placeholder(template, offset));
            }
            (&braced[..len], len + 2)
        } else {
            let len = identifier_len(after);
            if len == 0 {
                return Err(invalid_placeholder(template, offset));
            }
            (&after[..len], len)
        };
        let (_, val) = vars
            .iter()
            .find(|(k, _)| *k == key)
            .ok_or_else(|| Error::Template(key.to_owned()))?;
        ret.push_str(val);
        rest = &after[len..];
    }
    ret.push_str(rest);
    Ok(ret)
}
