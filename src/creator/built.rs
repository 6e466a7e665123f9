//! Values produced by the object builder.

use crate::core::UsefulError;
use crate::value::Scalar;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A constructed object with its marker key as type name.
///
/// Cloning an `Instance` shares the underlying object; use [`Instance::ptr_eq`] to
/// observe identity.
#[derive(Clone)]
pub struct Instance {
    type_name: Arc<str>,
    object: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Wrap a freshly constructed object.
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, object: T) -> Self {
        Self {
            type_name: Arc::from(type_name.into()),
            object: Arc::new(object),
        }
    }

    /// The marker key this instance was built from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Shared handle to the object if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.object).downcast::<T>().ok()
    }

    /// Borrow the object if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// `true` when both handles point at the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("object", &Arc::as_ptr(&self.object))
            .finish()
    }
}

/// Result of building a [`ValueGraph`](crate::value::ValueGraph) node.
#[derive(Debug, Clone)]
pub enum BuiltValue {
    /// Scalar copied from the source graph
    Scalar(Scalar),
    /// Built sequence
    Sequence(Vec<BuiltValue>),
    /// Built plain mapping
    Mapping(IndexMap<String, BuiltValue>),
    /// Object produced by a constructor
    Instance(Instance),
}

/// Instances compare by identity, everything else structurally.
impl PartialEq for BuiltValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Mapping(a), Self::Mapping(b)) => a == b,
            (Self::Instance(a), Self::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl BuiltValue {
    /// Wrap `object` as an instance named `type_name`.
    pub fn instance<T: Any + Send + Sync>(type_name: impl Into<String>, object: T) -> Self {
        Self::Instance(Instance::new(type_name, object))
    }

    /// Borrow the instance, if this is one.
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Shared handle to the object if this is an instance of `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.as_instance().and_then(Instance::downcast::<T>)
    }

    /// Borrow the scalar, if this is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Borrow the string content of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// Borrow the entries of a plain mapping.
    pub fn as_mapping(&self) -> Option<&IndexMap<String, BuiltValue>> {
        match self {
            Self::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Borrow the items of a sequence.
    pub fn as_sequence(&self) -> Option<&[BuiltValue]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key of a plain mapping.
    pub fn get(&self, key: &str) -> Option<&BuiltValue> {
        self.as_mapping().and_then(|entries| entries.get(key))
    }

    /// Follow a dotted path such as `"database.replicas.0.host"`.
    ///
    /// Mapping keys are matched literally; sequence steps must be indices.
    pub fn get_path(&self, path: &str) -> Result<&BuiltValue, UsefulError> {
        let invalid = || UsefulError::InvalidPath {
            path: path.to_string(),
        };

        let mut current = self;
        for step in path.split('.').filter(|step| !step.is_empty()) {
            current = match current {
                Self::Mapping(entries) => entries.get(step).ok_or_else(invalid)?,
                Self::Sequence(items) => {
                    let index: usize = step.parse().map_err(|_| invalid())?;
                    items.get(index).ok_or_else(invalid)?
                }
                _ => return Err(invalid()),
            };
        }
        Ok(current)
    }

    /// Render as JSON. Instances become `{"$instance": "<type name>"}`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Scalar(scalar) => scalar.to_json(),
            Self::Sequence(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Mapping(entries) => serde_json::Value::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::Instance(instance) => serde_json::json!({ "$instance": instance.type_name() }),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for BuiltValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_from_scalar!(&str, String, i64, i32, f64, bool);

impl From<Scalar> for BuiltValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

/// Constructor arguments after recursive building.
///
/// A marker whose value is a mapping yields named arguments, a sequence yields
/// positional arguments, `null` yields none and any other value becomes the single
/// positional argument.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    type_path: String,
    positional: Vec<BuiltValue>,
    named: IndexMap<String, BuiltValue>,
}

impl Arguments {
    /// Arguments for the constructor registered as `type_path`.
    pub fn new(type_path: impl Into<String>) -> Self {
        Self {
            type_path: type_path.into(),
            ..Self::default()
        }
    }

    /// Unpack built marker parameters the way the builder does.
    pub fn from_params(type_path: impl Into<String>, params: BuiltValue) -> Self {
        let mut arguments = Self::new(type_path);
        match params {
            BuiltValue::Mapping(named) => arguments.named = named,
            BuiltValue::Sequence(positional) => arguments.positional = positional,
            BuiltValue::Scalar(Scalar::Null) => {}
            other => arguments.positional.push(other),
        }
        arguments
    }

    /// Add a named argument.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<BuiltValue>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// The marker key being constructed.
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    /// Positional arguments in declaration order.
    pub fn positional(&self) -> &[BuiltValue] {
        &self.positional
    }

    /// Named arguments in declaration order.
    pub fn named(&self) -> &IndexMap<String, BuiltValue> {
        &self.named
    }

    /// Total number of arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// `true` when no arguments were given.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow a named argument.
    pub fn get(&self, name: &str) -> Option<&BuiltValue> {
        self.named.get(name)
    }

    /// Remove and return a named argument.
    pub fn take(&mut self, name: &str) -> Option<BuiltValue> {
        self.named.shift_remove(name)
    }

    /// Borrow a named argument that must be present.
    pub fn required(&self, name: &str) -> Result<&BuiltValue, UsefulError> {
        self.get(name).ok_or_else(|| self.invalid(format!("missing argument '{name}'")))
    }

    /// Required integer argument.
    pub fn i64(&self, name: &str) -> Result<i64, UsefulError> {
        self.required(name)?
            .as_scalar()
            .and_then(Scalar::as_i64)
            .ok_or_else(|| self.invalid(format!("argument '{name}' must be an integer")))
    }

    /// Required numeric argument; integers are widened.
    pub fn f64(&self, name: &str) -> Result<f64, UsefulError> {
        self.required(name)?
            .as_scalar()
            .and_then(Scalar::as_f64)
            .ok_or_else(|| self.invalid(format!("argument '{name}' must be a number")))
    }

    /// Required boolean argument.
    pub fn bool(&self, name: &str) -> Result<bool, UsefulError> {
        self.required(name)?
            .as_scalar()
            .and_then(Scalar::as_bool)
            .ok_or_else(|| self.invalid(format!("argument '{name}' must be a boolean")))
    }

    /// Required string argument.
    pub fn string(&self, name: &str) -> Result<String, UsefulError> {
        self.required(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(format!("argument '{name}' must be a string")))
    }

    /// Required argument holding an instance of `T`.
    pub fn instance<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, UsefulError> {
        self.required(name)?.downcast::<T>().ok_or_else(|| {
            self.invalid(format!(
                "argument '{name}' must be an instance of {}",
                std::any::type_name::<T>()
            ))
        })
    }

    fn invalid(&self, reason: String) -> UsefulError {
        UsefulError::InvalidArguments {
            type_path: self.type_path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Widget {
        size: i64,
    }

    #[test]
    fn test_instance_identity() {
        let a = Instance::new("pkg.Widget", Widget { size: 1 });
        let b = a.clone();
        let c = Instance::new("pkg.Widget", Widget { size: 1 });

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a.downcast_ref::<Widget>().unwrap().size, 1);
        assert!(a.downcast::<String>().is_none());
    }

    #[test]
    fn test_get_path() {
        let mut inner = IndexMap::new();
        inner.insert("host".to_string(), BuiltValue::from("db1"));
        let mut root = IndexMap::new();
        root.insert(
            "replicas".to_string(),
            BuiltValue::Sequence(vec![BuiltValue::Mapping(inner)]),
        );
        let value = BuiltValue::Mapping(root);

        assert_eq!(value.get_path("replicas.0.host").unwrap().as_str(), Some("db1"));
        assert!(matches!(
            value.get_path("replicas.1.host"),
            Err(UsefulError::InvalidPath { .. })
        ));
        assert!(value.get_path("replicas.x").is_err());
    }

    #[test]
    fn test_arguments_from_params() {
        let named = Arguments::from_params(
            "pkg.Widget",
            BuiltValue::Mapping(IndexMap::from([("size".to_string(), BuiltValue::from(3))])),
        );
        assert_eq!(named.i64("size").unwrap(), 3);

        let positional = Arguments::from_params("pkg.Widget", BuiltValue::from("x"));
        assert_eq!(positional.positional().len(), 1);

        let empty = Arguments::from_params("pkg.Widget", BuiltValue::Scalar(Scalar::Null));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_arguments_type_errors() {
        let args = Arguments::new("pkg.Widget").with("size", "big");
        let error = args.i64("size").unwrap_err();
        assert!(error.to_string().contains("must be an integer"));
        assert!(args.string("missing").is_err());
    }
}
