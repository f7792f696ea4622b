//! Startup configuration: which bundles to load and which database to open.
use crate::{
    bridge::QueryBridge,
    bundles::Builtins,
    connection::{Database, OpenFlags},
    extension::{ImplementationSource, Loader},
    registry::{DuplicatePolicy, Registry},
    types::*,
};
use std::{env, path::PathBuf, sync::Arc};
use tracing::{debug, instrument};

/// Environment variable naming the database to open.
pub const DATABASE_ENV: &str = "SEQSQL_DATABASE";
/// Environment variable listing extra bundle descriptor files, separated like `PATH`.
pub const BUNDLE_PATH_ENV: &str = "SEQSQL_BUNDLE_PATH";

/// Options for creating a [Host].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOptions {
    database: String,
    read_only: bool,
    policy: DuplicatePolicy,
    builtins: bool,
    bundle_paths: Vec<PathBuf>,
}

impl Default for HostOptions {
    fn default() -> Self {
        HostOptions {
            database: ":memory:".to_owned(),
            read_only: false,
            policy: DuplicatePolicy::default(),
            builtins: true,
            bundle_paths: vec![],
        }
    }
}

impl HostOptions {
    /// Start from the defaults, then apply [DATABASE_ENV] and [BUNDLE_PATH_ENV] if they are
    /// set.
    pub fn from_env() -> Self {
        let mut ret = HostOptions::default();
        if let Some(db) = env::var_os(DATABASE_ENV) {
            ret = ret.set_database(db.to_string_lossy());
        }
        if let Some(paths) = env::var_os(BUNDLE_PATH_ENV) {
            for p in env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()) {
                ret = ret.add_bundle_path(p);
            }
        }
        ret
    }

    /// The database each connection opens: a filename, `:memory:`, or a `file:` URI. The
    /// default is `:memory:`, which gives every connection its own empty database.
    pub fn set_database(mut self, val: impl Into<String>) -> Self {
        self.database = val.into();
        self
    }

    pub fn set_read_only(mut self, val: bool) -> Self {
        self.read_only = val;
        self
    }

    /// What happens when two bundles declare the same function. The default is
    /// [DuplicatePolicy::Fail].
    pub fn set_duplicate_policy(mut self, val: DuplicatePolicy) -> Self {
        self.policy = val;
        self
    }

    /// Whether to load the built-in bundles. The default is true.
    pub fn set_builtins(mut self, val: bool) -> Self {
        self.builtins = val;
        self
    }

    /// Load the bundle descriptor at `path` after the built-in bundles.
    pub fn add_bundle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bundle_paths.push(path.into());
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn bundle_paths(&self) -> &[PathBuf] {
        &self.bundle_paths
    }

    fn open_flags(&self) -> OpenFlags {
        if self.read_only {
            OpenFlags::READ_ONLY | OpenFlags::URI
        } else {
            OpenFlags::default()
        }
    }
}

/// A loaded registry plus the options for opening connections against it.
///
/// The registry is frozen when the host is created. [Host::connect] may be called from any
/// thread, and every connection shares the same registry.
#[derive(Debug, Clone)]
pub struct Host {
    registry: Arc<Registry>,
    options: HostOptions,
}

impl Host {
    /// Load the configured bundles using the built-in implementations.
    pub fn new(options: HostOptions) -> Result<Host> {
        Host::with_source(options, Builtins)
    }

    /// Load the configured bundles, resolving descriptor files through `source` and then
    /// through the built-in implementations.
    #[instrument(name = "host::new", level = "trace", skip(source))]
    pub fn with_source<S: ImplementationSource>(options: HostOptions, source: S) -> Result<Host> {
        let mut registry = Registry::with_policy(options.policy);
        {
            let mut loader = Loader::new(&mut registry, (source, Builtins));
            if options.builtins {
                for desc in Builtins::descriptors()? {
                    loader.load(&desc)?;
                }
            }
            for path in &options.bundle_paths {
                loader.load_path(path)?;
            }
        }
        debug!(
            functions = registry.len(),
            bundles = registry.bundles().count(),
            "host ready"
        );
        Ok(Host {
            registry: Arc::new(registry),
            options,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    /// Open a new connection to the configured database with every function installed.
    pub fn connect(&self) -> Result<QueryBridge> {
        let db = Database::open(&self.options.database, self.options.open_flags())?;
        QueryBridge::new(db, self.registry.clone())
    }
}

/// Create a [Host] from `options` and open one connection.
pub fn connect(options: HostOptions) -> Result<QueryBridge> {
    Host::new(options)?.connect()
}
