//! The function registry: the single source of truth for which functions exist.
use crate::{extension::ExtensionBundle, function::*, types::*, value::Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What [Registry::register] does when the name is already taken.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with [Error::DuplicateName]. This is the default.
    #[default]
    Fail,
    /// Replace the existing function. The last registration wins.
    Overwrite,
}

/// A function as stored in the [Registry].
pub struct RegisteredFunction {
    signature: FunctionSignature,
    options: FunctionOptions,
    func: FunctionImpl,
    bundle: Option<String>,
}

impl RegisteredFunction {
    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    pub fn options(&self) -> &FunctionOptions {
        &self.options
    }

    /// The bundle which registered this function, if any.
    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    /// Invoke the implementation directly, without checking the arguments. See
    /// [Evaluator](crate::Evaluator) for the checked version.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for RegisteredFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredFunction")
            .field("signature", &self.signature)
            .field("options", &self.options)
            .field("bundle", &self.bundle)
            .finish_non_exhaustive()
    }
}

/// A bundle that has been loaded into a [Registry].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleInfo {
    version: String,
    functions: Vec<String>,
}

impl BundleInfo {
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The functions this bundle still owns. A function that was overwritten by another
    /// registration no longer appears here.
    pub fn functions(&self) -> &[String] {
        &self.functions
    }
}

/// Maps function names to their signatures and implementations.
///
/// Names are compared case-insensitively, as SQLite does. A registry is mutable only while
/// it is being populated; afterwards it is meant to be shared as an `Arc<Registry>`, and all
/// lookups go through `&self` without locking.
#[derive(Debug, Default)]
pub struct Registry {
    functions: BTreeMap<String, RegisteredFunction>,
    bundles: BTreeMap<String, BundleInfo>,
    policy: DuplicatePolicy,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Registry {
            policy,
            ..Self::default()
        }
    }

    /// Register a function with the default [FunctionOptions].
    pub fn register<F: ScalarFunction + 'static>(
        &mut self,
        signature: FunctionSignature,
        func: F,
    ) -> Result<()> {
        self.register_with(signature, FunctionOptions::default(), func)
    }

    pub fn register_with<F: ScalarFunction + 'static>(
        &mut self,
        signature: FunctionSignature,
        options: FunctionOptions,
        func: F,
    ) -> Result<()> {
        self.check_vacant(signature.name())?;
        self.insert(RegisteredFunction {
            signature,
            options,
            func: Box::new(func),
            bundle: None,
        });
        Ok(())
    }

    /// Look up a function by name.
    pub fn lookup(&self, name: &str) -> Result<&RegisteredFunction> {
        self.functions
            .get(&key(name))
            .ok_or_else(|| Error::NotFound(format!("function {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&key(name))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Iterate over all registered functions, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredFunction> {
        self.functions.values()
    }

    /// Returns the loaded bundle with the given name.
    pub fn bundle(&self, name: &str) -> Option<&BundleInfo> {
        self.bundles.get(name)
    }

    /// Iterate over the names of the loaded bundles.
    pub fn bundles(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    pub fn is_loaded(&self, bundle: &str) -> bool {
        self.bundles.contains_key(bundle)
    }

    /// Register every function of a bundle, or none of them.
    pub(crate) fn insert_bundle(&mut self, bundle: ExtensionBundle) -> Result<()> {
        let (name, version, functions) = bundle.into_parts();
        if self.is_loaded(&name) {
            return Err(Error::AlreadyLoaded(name));
        }
        let mut names: Vec<String> = Vec::with_capacity(functions.len());
        for (signature, _, _) in &functions {
            let k = key(signature.name());
            if names.contains(&k) {
                return Err(Error::DuplicateName(signature.name().to_owned()));
            }
            self.check_vacant(signature.name())?;
            names.push(k);
        }
        for (signature, options, func) in functions {
            self.insert(RegisteredFunction {
                signature,
                options,
                func,
                bundle: Some(name.clone()),
            });
        }
        debug!(bundle = %name, %version, functions = names.len(), "loaded bundle");
        self.bundles.insert(
            name,
            BundleInfo {
                version,
                functions: names,
            },
        );
        Ok(())
    }

    /// Remove a bundle and every function it still owns.
    pub(crate) fn remove_bundle(&mut self, name: &str) -> Result<()> {
        let info = self
            .bundles
            .remove(name)
            .ok_or_else(|| Error::NotFound(format!("bundle {}", name)))?;
        for f in &info.functions {
            self.functions.remove(f);
        }
        debug!(bundle = name, "unloaded bundle");
        Ok(())
    }

    fn check_vacant(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_input("function name must not be empty"));
        }
        match self.policy {
            DuplicatePolicy::Fail if self.contains(name) => {
                Err(Error::DuplicateName(name.to_owned()))
            }
            _ => Ok(()),
        }
    }

    fn insert(&mut self, entry: RegisteredFunction) {
        let k = key(entry.signature.name());
        debug!(signature = %entry.signature, bundle = ?entry.bundle, "registered function");
        if let Some(old) = self.functions.insert(k.clone(), entry) {
            warn!(signature = %old.signature, "overwrote existing function");
            // The old owner must not remove the new function when it is unloaded.
            if let Some(owner) = old.bundle {
                if let Some(info) = self.bundles.get_mut(&owner) {
                    info.functions.retain(|f| *f != k);
                }
            }
        }
    }
}
