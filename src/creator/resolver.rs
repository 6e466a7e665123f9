//! Mapping marker keys to constructors.
//!
//! The builder never knows about concrete types. It asks a [`Resolver`] whether a
//! mapping key is a construction marker and, if so, for the [`Constructor`] behind it.
//! Two resolvers are provided:
//!
//! - [`TypeRegistry`] only accepts names that were registered explicitly.
//! - [`DottedPathResolver`] accepts any `module.path.TypeName` shaped key as a marker
//!   and looks the path up in its registry, so an unknown dotted path surfaces as
//!   [`UsefulError::UnresolvedType`] instead of silently becoming data.

use super::built::{Arguments, BuiltValue};
use crate::core::UsefulError;
use regex::Regex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// A callable turning built arguments into a value.
pub type Constructor = Arc<dyn Fn(Arguments) -> anyhow::Result<BuiltValue> + Send + Sync>;

/// Module reported for type paths without a dot.
pub const DEFAULT_MODULE: &str = "__main__";

static DOTTED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)+$")
        .expect("dotted path pattern is valid")
});

/// Capability used by the builder to recognise and resolve construction markers.
pub trait Resolver: Send + Sync {
    /// Whether `key`, as the only key of a mapping, marks a construction.
    fn is_marker(&self, key: &str) -> bool;

    /// Look up the constructor for a marker key.
    fn resolve(&self, key: &str) -> Result<Constructor, UsefulError>;
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn is_marker(&self, key: &str) -> bool {
        (**self).is_marker(key)
    }

    fn resolve(&self, key: &str) -> Result<Constructor, UsefulError> {
        (**self).resolve(key)
    }
}

/// `true` for keys like `pkg.Widget` or `a.b.c.Type`.
pub fn is_dotted_path(key: &str) -> bool {
    DOTTED_PATH.is_match(key)
}

/// Split a type path into `(module, name)` at its last dot.
///
/// ```rust
/// use useful::creator::split_type_path;
///
/// assert_eq!(split_type_path("a.b.Widget"), ("a.b", "Widget"));
/// assert_eq!(split_type_path("Widget"), ("__main__", "Widget"));
/// ```
pub fn split_type_path(path: &str) -> (&str, &str) {
    path.rsplit_once('.').unwrap_or((DEFAULT_MODULE, path))
}

/// Registry of constructors keyed by exact name.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    constructors: HashMap<String, Constructor>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed factory. Its result is wrapped into an
    /// [`Instance`](super::Instance) named after `name`.
    pub fn register<T, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(move |arguments: Arguments| {
            let type_name = arguments.type_path().to_string();
            factory(arguments).map(|object| BuiltValue::instance(type_name, object))
        });
        self.constructors.insert(name.into(), constructor);
        self
    }

    /// Register a constructor that produces a [`BuiltValue`] directly.
    pub fn register_value<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(Arguments) -> anyhow::Result<BuiltValue> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Remove a registration, returning whether it existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.constructors.remove(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry").field("names", &self.names()).finish()
    }
}

impl Resolver for TypeRegistry {
    fn is_marker(&self, key: &str) -> bool {
        self.contains(key)
    }

    fn resolve(&self, key: &str) -> Result<Constructor, UsefulError> {
        self.constructors.get(key).cloned().ok_or_else(|| UsefulError::UnresolvedType {
            type_path: key.to_string(),
        })
    }
}

/// Resolver treating every dotted identifier as a marker.
///
/// Bare registered names are markers as well and may also be registered under
/// `__main__.<name>`.
#[derive(Debug, Clone, Default)]
pub struct DottedPathResolver {
    registry: TypeRegistry,
}

impl DottedPathResolver {
    /// Wrap a registry.
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    /// The backing registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Mutable access for late registrations.
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }
}

impl From<TypeRegistry> for DottedPathResolver {
    fn from(registry: TypeRegistry) -> Self {
        Self::new(registry)
    }
}

impl Resolver for DottedPathResolver {
    fn is_marker(&self, key: &str) -> bool {
        is_dotted_path(key) || self.registry.contains(key)
    }

    fn resolve(&self, key: &str) -> Result<Constructor, UsefulError> {
        if let Ok(constructor) = self.registry.resolve(key) {
            return Ok(constructor);
        }

        if !key.contains('.') {
            let qualified = format!("{DEFAULT_MODULE}.{key}");
            if let Ok(constructor) = self.registry.resolve(&qualified) {
                return Ok(constructor);
            }
        }

        Err(UsefulError::UnresolvedType {
            type_path: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register("pkg.Widget", |args: Arguments| Ok(args.i64("size")?));
        registry.register("__main__.Local", |_args: Arguments| Ok(()));
        registry
    }

    #[test]
    fn test_is_dotted_path() {
        assert!(is_dotted_path("pkg.Widget"));
        assert!(is_dotted_path("a.b_c.D2"));
        assert!(!is_dotted_path("Widget"));
        assert!(!is_dotted_path("pkg."));
        assert!(!is_dotted_path("1pkg.Widget"));
        assert!(!is_dotted_path("host.example.com:80"));
    }

    #[test]
    fn test_split_type_path() {
        assert_eq!(split_type_path("pkg.sub.Widget"), ("pkg.sub", "Widget"));
        assert_eq!(split_type_path("Widget"), ("__main__", "Widget"));
    }

    #[test]
    fn test_registry_resolves_registered_names_only() {
        let registry = registry();
        assert!(registry.is_marker("pkg.Widget"));
        assert!(!registry.is_marker("pkg.Other"));

        let constructor = registry.resolve("pkg.Widget").unwrap();
        let built = constructor(Arguments::new("pkg.Widget").with("size", 3)).unwrap();
        let instance = built.as_instance().unwrap();
        assert_eq!(instance.type_name(), "pkg.Widget");
        assert_eq!(*instance.downcast_ref::<i64>().unwrap(), 3);

        assert!(matches!(
            registry.resolve("pkg.Other"),
            Err(UsefulError::UnresolvedType { .. })
        ));
    }

    #[test]
    fn test_dotted_resolver_markers_and_fallback() {
        let resolver = DottedPathResolver::new(registry());
        assert!(resolver.is_marker("pkg.Unknown"));
        assert!(!resolver.is_marker("plain"));
        assert!(resolver.resolve("Local").is_ok());

        match resolver.resolve("pkg.Unknown") {
            Err(UsefulError::UnresolvedType { type_path }) => assert_eq!(type_path, "pkg.Unknown"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("unknown type resolved"),
        }
    }
}
