//! Argument values passed to class constructors
//!
//! An [`Argument`] is either a plain value supplied by the caller (strings,
//! numbers, lists) or something the container resolved: a service instance or
//! the container itself. Constructors receive them through [`Arguments`], keyed
//! by parameter name.

use crate::{Container, DiError, Result, WeakContainer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased, shareable service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A single constructor argument.
#[derive(Clone)]
pub enum Argument {
    /// Explicit absence of a value
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Argument>),
    /// A resolved service, remembered together with the class it came from
    Service { class: String, instance: Instance },
    /// The container itself, held weakly so recorded arguments never keep
    /// the registry alive
    Container(WeakContainer),
}

impl Argument {
    /// Wrap a resolved instance.
    #[inline]
    pub fn service(class: impl Into<String>, instance: Instance) -> Self {
        Self::Service {
            class: class.into(),
            instance,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, or integers widened to floats.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[Argument]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The instance carried by a `Service` argument.
    #[inline]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Service { instance, .. } => Some(instance),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "array",
            Self::Service { .. } => "service",
            Self::Container(_) => "container",
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Service { class, .. } => f.debug_struct("Service").field("class", class).finish(),
            Self::Container(_) => f.write_str("Container"),
        }
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Argument {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Argument {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<Argument>> From<Vec<T>> for Argument {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Argument>> From<Option<T>> for Argument {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Argument {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(items) => serde::Serialize::serialize(items, serializer),
            Self::Service { class, .. } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("service", class)?;
                map.end()
            }
            Self::Container(_) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("service", Container::CLASS)?;
                map.end()
            }
        }
    }
}

/// The resolved arguments handed to a constructor, in declaration order.
///
/// # Examples
///
/// ```rust
/// use service_container::{Argument, Arguments};
///
/// let args = Arguments::new(
///     "app::Mailer",
///     vec![("host".into(), "smtp.local".into()), ("port".into(), Argument::Int(25))],
/// );
///
/// assert_eq!(args.string("host").unwrap(), "smtp.local");
/// assert_eq!(args.int("port").unwrap(), 25);
/// assert!(args.int("host").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Arguments {
    class: String,
    entries: Vec<(String, Argument)>,
}

impl Arguments {
    pub fn new(class: impl Into<String>, entries: Vec<(String, Argument)>) -> Self {
        Self {
            class: class.into(),
            entries,
        }
    }

    /// Class being constructed.
    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an argument by parameter name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.entries
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// Look up an argument by position.
    #[inline]
    pub fn at(&self, index: usize) -> Option<&Argument> {
        self.entries.get(index).map(|(_, value)| value)
    }

    /// Iterate `(name, argument)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Consume into the bare values, in declaration order.
    pub fn into_values(self) -> Vec<Argument> {
        self.entries.into_iter().map(|(_, value)| value).collect()
    }

    /// Argument for `name`, or `MissingArgument`.
    pub fn value(&self, name: &str) -> Result<&Argument> {
        self.get(name)
            .ok_or_else(|| DiError::missing_argument(&self.class, name))
    }

    pub fn string(&self, name: &str) -> Result<&str> {
        let value = self.value(name)?;
        value.as_str().ok_or_else(|| self.wrong_kind(name, "string", value))
    }

    /// A string argument that may also be `Null`.
    pub fn optional_string(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None | Some(Argument::Null) => Ok(None),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| self.wrong_kind(name, "string", value)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        let value = self.value(name)?;
        value.as_int().ok_or_else(|| self.wrong_kind(name, "int", value))
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        let value = self.value(name)?;
        value.as_float().ok_or_else(|| self.wrong_kind(name, "float", value))
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        let value = self.value(name)?;
        value.as_bool().ok_or_else(|| self.wrong_kind(name, "bool", value))
    }

    pub fn list(&self, name: &str) -> Result<&[Argument]> {
        let value = self.value(name)?;
        value.as_list().ok_or_else(|| self.wrong_kind(name, "array", value))
    }

    /// The container, for parameters declared as the container itself.
    ///
    /// Fails with [`DiError::MissingContainer`] once the container is dropped.
    pub fn container(&self, name: &str) -> Result<Container> {
        match self.value(name)? {
            Argument::Container(container) => container.upgrade().ok_or(DiError::MissingContainer),
            other => Err(self.wrong_kind(name, "container", other)),
        }
    }

    /// A concrete service dependency, downcast to `T`.
    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let value = self.value(name)?;
        let instance = value
            .as_instance()
            .ok_or_else(|| self.wrong_kind(name, "service", value))?;

        Arc::clone(instance).downcast::<T>().map_err(|_| {
            DiError::invalid_argument(
                &self.class,
                name,
                format!("expected {}", std::any::type_name::<T>()),
            )
        })
    }

    /// An interface dependency in its trait-object form, e.g. `Arc<dyn Transport>`.
    ///
    /// The implementing class must declare the interface with
    /// [`ClassDefinition::implements_as`](crate::ClassDefinition::implements_as)
    /// so the container can hand over the cast form.
    pub fn interface<I>(&self, name: &str) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let value = self.value(name)?;
        let instance = value
            .as_instance()
            .ok_or_else(|| self.wrong_kind(name, "service", value))?;

        instance.downcast_ref::<Arc<I>>().cloned().ok_or_else(|| {
            DiError::invalid_argument(
                &self.class,
                name,
                format!("expected {}", std::any::type_name::<Arc<I>>()),
            )
        })
    }

    fn wrong_kind(&self, name: &str, expected: &str, found: &Argument) -> DiError {
        DiError::invalid_argument(
            &self.class,
            name,
            format!("expected {expected}, found {}", found.kind()),
        )
    }
}
