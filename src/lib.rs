//! Load bundles of scalar functions into a registry, and call them from SQL queries run on
//! an embedded SQLite database.
//!
//! # Loading bundles
//!
//! A bundle is a named, versioned set of functions. It is described by a JSON
//! [BundleDescriptor] naming an implementation handle and the signatures of its functions;
//! a [Loader] resolves the handle through an [ImplementationSource] and registers every
//! function in a [Registry]. Bundles can also be built in code with [ExtensionBundle].
//!
//! The crate ships three built-in bundles, resolved by [Builtins]: `sequence` (nucleotide
//! sequence functions such as `gc_content`), `sam` (SAM record flag tests such as
//! `is_duplicate`) and `greeting`.
//!
//! # Querying
//!
//! Once loaded, the registry is frozen in an `Arc` and shared by every connection. A
//! [QueryBridge] installs the registry's functions into a connection, runs query text and
//! returns the resulting [Row]s in order. Every call from SQL goes through an [Evaluator],
//! which checks the arguments against the function's [FunctionSignature]; its typed errors
//! are returned from [QueryBridge::run] unchanged.
//!
//! ```no_run
//! use seqsql::*;
//!
//! fn main() -> Result<()> {
//!     let mut conn = connect(HostOptions::default())?;
//!     let rows = conn.run("SELECT gc_content('ATCG') AS value")?;
//!     assert_eq!(rows[0].get("value"), Some(&Value::Float(0.5)));
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `bundled` (default) compiles SQLite from source through libsqlite3-sys.
//! - `with_rusqlite` allows installing the registry into a `rusqlite::Connection` with
//!   `Connection::from_rusqlite` and [install].
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use bridge::{install, BridgeState, QueryBridge};
pub use bundles::Builtins;
pub use connection::*;
pub use eval::Evaluator;
pub use extension::{BundleDescriptor, ExtensionBundle, FunctionDecl, ImplementationSource, Loader};
pub use function::{FunctionOptions, FunctionSignature, Kind, ScalarFunction};
pub use host::{connect, Host, HostOptions};
pub use query::Row;
pub use registry::{DuplicatePolicy, Registry};
pub use types::*;
pub use value::*;

mod bridge;
pub mod bundles;
mod connection;
mod eval;
pub mod extension;
pub mod ffi;
pub mod function;
pub mod host;
pub mod query;
pub mod registry;
mod test_helpers;
mod types;
mod value;
