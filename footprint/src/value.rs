use std::borrow::Cow;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

/// A rendered argument or return value, as it appears in a log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// String-typed value. Rendered quoted, with line breaks collapsed.
    Str(String),

    /// Any other value, already turned into its textual representation.
    Repr(String),

    /// A receiver: the type it belongs to and its representation.
    Instance {
        class: String,
        repr: String
    },

    /// A type used as a receiver (`cls`).
    Class(String),

    None,
}

impl Value {
    pub fn str<S: Into<String>>(value: S) -> Self {
        Value::Str(value.into())
    }

    pub fn repr<T: Debug + ?Sized>(value: &T) -> Self {
        Value::Repr(format!("{:?}", value))
    }

    pub fn display<T: Display + ?Sized>(value: &T) -> Self {
        Value::Repr(value.to_string())
    }

    pub fn instance<C: Into<String>>(class: C, value: Value) -> Self {
        let repr = match value {
            Value::Repr(repr) | Value::Str(repr) => repr,
            other => other.to_string(),
        };

        Value::Instance { class: class.into(), repr }
    }

    pub fn class<C: Into<String>>(class: C) -> Self {
        Value::Class(class.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Name of the type this value stands for, when it is a receiver.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Value::Instance { class, .. } => Some(class),
            Value::Class(class) => Some(class),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(value) => write!(f, "'{}'", collapse_line_breaks(value)),
            Value::Repr(repr) => f.write_str(repr),
            Value::Instance { repr, .. } => f.write_str(repr),
            Value::Class(class) => f.write_str(class),
            Value::None => f.write_str("None"),
        }
    }
}

pub fn collapse_line_breaks(value: &str) -> Cow<'_, str> {
    if !value.contains('\n') {
        return Cow::Borrowed(value);
    }

    Cow::Owned(value.replace("\r\n", " ").replace('\n', " "))
}

/// Last path segment of a type name, without references or generic arguments.
///
/// `&mut my_crate::shapes::Circle<f32>` becomes `Circle`.
pub fn short_type_name(type_name: &str) -> &str {
    let mut name = type_name.trim_start_matches('&');
    name = name.strip_prefix("mut ").unwrap_or(name);

    if let Some(generics) = name.find('<') {
        name = &name[..generics];
    }

    match name.rfind("::") {
        Some(separator) => &name[separator + 2..],
        None => name,
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Value::None,
        }
    }
}

macro_rules! display_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Repr(value.to_string())
                }
            }
        )*
    };
}

display_value!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Borrowed value waiting to be rendered. The generated code calls
/// `(&&&Probe::new(&value)).footprint_value()`, and method resolution picks the
/// first of [StrValue], [DisplayValue], [DebugValue], [OpaqueValue] that the
/// type supports.
///
/// Support is judged from the bounds in scope at the call site, so a generic
/// `T` with neither `Display` nor `Debug` in its bounds falls through to
/// [OpaqueValue] whatever the concrete type is.
pub struct Probe<'a, T: ?Sized>(pub &'a T);

impl<'a, T: ?Sized> Probe<'a, T> {
    pub fn new(value: &'a T) -> Self {
        Probe(value)
    }
}

impl<T: ?Sized> Clone for Probe<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Probe<'_, T> {}

pub trait StrValue {
    fn footprint_value(self) -> Value;
}

pub trait DisplayValue {
    fn footprint_value(self) -> Value;
}

pub trait DebugValue {
    fn footprint_value(self) -> Value;
}

pub trait OpaqueValue {
    fn footprint_value(self) -> Value;
}

macro_rules! str_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StrValue for &&&Probe<'_, $ty> {
                fn footprint_value(self) -> Value {
                    Value::Str(self.0.to_string())
                }
            }
        )*
    };
}

str_value!(str, &str, &&str, &mut str, String, &String, &mut String, Box<str>, Cow<'_, str>);

impl<T: Display + ?Sized> DisplayValue for &&Probe<'_, T> {
    fn footprint_value(self) -> Value {
        Value::Repr(self.0.to_string())
    }
}

impl<T: Debug + ?Sized> DebugValue for &Probe<'_, T> {
    fn footprint_value(self) -> Value {
        Value::Repr(format!("{:?}", self.0))
    }
}

impl<T: ?Sized> OpaqueValue for Probe<'_, T> {
    fn footprint_value(self) -> Value {
        Value::Repr(format!("<{}>", short_type_name(std::any::type_name::<T>())))
    }
}
