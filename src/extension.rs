//! Extension bundles and the loader that registers them.
use crate::{function::*, registry::Registry, types::*};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, instrument};

/// One function declared in a [BundleDescriptor].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionDecl {
    pub name: String,
    /// The name the implementation source knows this function by. Defaults to `name`.
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub params: Vec<Kind>,
    pub returns: Kind,
    #[serde(default = "default_true")]
    pub deterministic: bool,
}

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "0.0.0".to_owned()
}

impl FunctionDecl {
    pub fn symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or(&self.name)
    }

    pub fn signature(&self) -> FunctionSignature {
        FunctionSignature::new(self.name.as_str(), self.params.iter().copied(), self.returns)
    }

    pub fn options(&self) -> FunctionOptions {
        FunctionOptions::default().set_deterministic(self.deterministic)
    }
}

/// The declarative description of a bundle: what it is called, where its implementations
/// live, and the signatures of its functions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleDescriptor {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Handle passed to the [ImplementationSource], e.g. `builtin:sequence`.
    pub implementation: String,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

impl BundleDescriptor {
    /// Parse a descriptor from JSON. `origin` names the descriptor in error messages.
    pub fn from_json(origin: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::load(origin, e))
    }

    /// Read and parse a JSON descriptor file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|e| Error::load(origin.as_str(), e))?;
        Self::from_json(&origin, &json)
    }
}

/// Resolves the implementation handle and symbols of a descriptor to code.
pub trait ImplementationSource {
    /// Returns true if this source knows the implementation handle.
    fn provides(&self, handle: &str) -> bool;

    /// Returns the implementation of `symbol` within `handle`, if there is one.
    fn resolve(&self, handle: &str, symbol: &str) -> Option<FunctionImpl>;
}

impl<S: ImplementationSource + ?Sized> ImplementationSource for &S {
    fn provides(&self, handle: &str) -> bool {
        (**self).provides(handle)
    }

    fn resolve(&self, handle: &str, symbol: &str) -> Option<FunctionImpl> {
        (**self).resolve(handle, symbol)
    }
}

/// Consults the first source, then the second for handles the first does not provide.
impl<A: ImplementationSource, B: ImplementationSource> ImplementationSource for (A, B) {
    fn provides(&self, handle: &str) -> bool {
        self.0.provides(handle) || self.1.provides(handle)
    }

    fn resolve(&self, handle: &str, symbol: &str) -> Option<FunctionImpl> {
        if self.0.provides(handle) {
            self.0.resolve(handle, symbol)
        } else {
            self.1.resolve(handle, symbol)
        }
    }
}

/// A named, versioned set of functions with their implementations, ready to be registered.
pub struct ExtensionBundle {
    name: String,
    version: String,
    functions: Vec<(FunctionSignature, FunctionOptions, FunctionImpl)>,
}

impl ExtensionBundle {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        ExtensionBundle {
            name: name.into(),
            version: version.into(),
            functions: vec![],
        }
    }

    /// Add a function with the default [FunctionOptions].
    pub fn with_function<F: ScalarFunction + 'static>(
        self,
        signature: FunctionSignature,
        func: F,
    ) -> Self {
        self.with_function_opts(signature, FunctionOptions::default(), func)
    }

    pub fn with_function_opts<F: ScalarFunction + 'static>(
        mut self,
        signature: FunctionSignature,
        options: FunctionOptions,
        func: F,
    ) -> Self {
        self.functions.push((signature, options, Box::new(func)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// The signatures of the functions in this bundle, in declaration order.
    pub fn signatures(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.iter().map(|(s, _, _)| s)
    }

    /// Build a bundle from a descriptor, resolving every symbol through `source`.
    ///
    /// Nothing is registered here; a descriptor which fails to resolve has no effect.
    pub fn resolve<S: ImplementationSource>(desc: &BundleDescriptor, source: &S) -> Result<Self> {
        if desc.name.is_empty() {
            return Err(Error::load("<unnamed>", "bundle name must not be empty"));
        }
        if !source.provides(&desc.implementation) {
            return Err(Error::load(
                desc.name.as_str(),
                format!("unknown implementation {:?}", desc.implementation),
            ));
        }
        let mut bundle = ExtensionBundle::new(desc.name.as_str(), desc.version.as_str());
        for decl in &desc.functions {
            if decl.name.is_empty() {
                return Err(Error::load(desc.name.as_str(), "function name must not be empty"));
            }
            if bundle
                .signatures()
                .any(|s| s.name().eq_ignore_ascii_case(&decl.name))
            {
                return Err(Error::load(
                    desc.name.as_str(),
                    format!("function {} is declared more than once", decl.name),
                ));
            }
            let func = source
                .resolve(&desc.implementation, decl.symbol())
                .ok_or_else(|| {
                    Error::load(
                        desc.name.as_str(),
                        format!(
                            "{} does not provide symbol {:?}",
                            desc.implementation,
                            decl.symbol()
                        ),
                    )
                })?;
            bundle
                .functions
                .push((decl.signature(), decl.options(), func));
        }
        Ok(bundle)
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        String,
        String,
        Vec<(FunctionSignature, FunctionOptions, FunctionImpl)>,
    ) {
        (self.name, self.version, self.functions)
    }
}

impl std::fmt::Debug for ExtensionBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionBundle")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("functions", &self.signatures().collect::<Vec<_>>())
            .finish()
    }
}

/// Populates a [Registry] from bundles.
///
/// Loading happens before the registry is shared; the loader holds the only mutable borrow.
pub struct Loader<'r, S> {
    registry: &'r mut Registry,
    source: S,
}

impl<'r, S: ImplementationSource> Loader<'r, S> {
    pub fn new(registry: &'r mut Registry, source: S) -> Self {
        Loader { registry, source }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Resolve a descriptor and register all of its functions.
    ///
    /// Either every function is registered or, on error, the registry is unchanged.
    #[instrument(name = "extension::load", level = "trace", skip(self, desc), fields(bundle = %desc.name))]
    pub fn load(&mut self, desc: &BundleDescriptor) -> Result<()> {
        if self.registry.is_loaded(&desc.name) {
            return Err(Error::AlreadyLoaded(desc.name.clone()));
        }
        let bundle = ExtensionBundle::resolve(desc, &self.source)?;
        self.registry.insert_bundle(bundle)
    }

    /// Read a JSON descriptor from `path` and load it.
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading bundle descriptor");
        let desc = BundleDescriptor::from_path(path)?;
        self.load(&desc)
    }

    /// Register a bundle that was built in code.
    pub fn load_bundle(&mut self, bundle: ExtensionBundle) -> Result<()> {
        self.registry.insert_bundle(bundle)
    }

    /// Remove a loaded bundle and the functions it registered. The bundle may be loaded
    /// again afterwards.
    pub fn unload(&mut self, name: &str) -> Result<()> {
        self.registry.remove_bundle(name)
    }
}
