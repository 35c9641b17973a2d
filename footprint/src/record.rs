use crate::value::Value;

/// Name given to positional arguments past the declared parameters.
pub const UNNAMED: &str = "?";

/// A declared parameter, with its default when it has one.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Value>,
}

impl Param {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self { name: name.into(), default: None }
    }

    pub fn with_default<N: Into<String>, V: Into<Value>>(name: N, default: V) -> Self {
        Self { name: name.into(), default: Some(default.into()) }
    }
}

/// Arguments of one invocation, as the caller passed them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg<V: Into<Value>>(mut self, value: V) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg<N: Into<String>, V: Into<Value>>(mut self, name: N, value: V) -> Self {
        self.keywords.push((name.into(), value.into()));
        self
    }

    /// Same arguments with `receiver` bound in front, the way a method call
    /// passes its instance.
    pub fn bind(&self, receiver: Value) -> Self {
        let mut positional = Vec::with_capacity(self.positional.len() + 1);
        positional.push(receiver);
        positional.extend(self.positional.iter().cloned());

        Self { positional, keywords: self.keywords.clone() }
    }
}

/// Ordered (name, value) pairs describing one call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallRecord {
    entries: Vec<(String, Value)>,
}

impl CallRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges declared defaults, positional and keyword arguments.
    ///
    /// Declared parameters come first, in declaration order, then keyword
    /// names that were not declared, then positional overflow as `?` entries.
    pub fn resolve(params: &[Param], args: &Args) -> Self {
        let mut record = CallRecord {
            entries: params.iter()
                .map(|param| (param.name.clone(), param.default.clone().unwrap_or(Value::None)))
                .collect(),
        };

        let mut unnamed = Vec::new();
        for (position, value) in args.positional.iter().enumerate() {
            match params.get(position) {
                Some(param) => record.set(&param.name, value.clone()),
                None => unnamed.push(value.clone()),
            }
        }

        for (name, value) in &args.keywords {
            record.set(name, value.clone());
        }

        for value in unnamed {
            record.push(UNNAMED, value);
        }

        record
    }

    pub fn push<N: Into<String>>(&mut self, name: N, value: Value) {
        self.entries.push((name.into(), value));
    }

    /// Overwrites the entry called `name`, or appends it.
    pub fn set(&mut self, name: &str, value: Value) {
        match self.entries.iter_mut().find(|(entry, _)| entry == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}
