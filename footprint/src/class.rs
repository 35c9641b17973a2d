use std::collections::HashSet;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::config::{Config, default_denylist};
use crate::errors::Error;
use crate::function::Function;
use crate::record::Args;
use crate::value::Value;
use crate::wrapper;

/// Attribute names looked up to render an instance, in order.
const STRING_CONVERSIONS: &[&str] = &["__str__", "to_string", "fmt"];

/// Something declared on a [Class]: a function, or any other value.
#[derive(Clone, Debug)]
pub enum Attribute {
    Function(Function),
    Value(Value),
}

impl Attribute {
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Attribute::Function(function) => Some(function),
            Attribute::Value(_) => None,
        }
    }
}

/// A named table of attributes, optionally inheriting from a base.
#[derive(Clone, Debug)]
pub struct Class {
    module: String,
    name: String,
    attributes: Vec<(String, Attribute)>,
    base: Option<Arc<Class>>,
}

impl Class {
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&Arc<Class>> {
        self.base.as_ref()
    }

    /// Attributes declared directly on this class, in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(name, attribute)| (name.as_str(), attribute))
    }

    /// Looks `name` up here, then along the bases.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, attribute)| attribute)
            .or_else(|| self.base.as_ref().and_then(|base| base.get(name)))
    }

    pub fn method(&self, name: &str) -> Result<&Function, Error> {
        self.get(name)
            .and_then(Attribute::as_function)
            .ok_or_else(|| Error::NoSuchAttribute {
                owner: self.name.clone(),
                name: name.to_string()
            })
    }

    /// A receiver for this class. Its representation comes from the first
    /// string conversion method the class has, like `str()` would.
    pub fn instance(&self) -> Result<Value, Error> {
        let placeholder = Value::Instance {
            class: self.name.clone(),
            repr: format!("<{}.{} object>", self.module.replace("::", "."), self.name),
        };

        for conversion in STRING_CONVERSIONS {
            if let Ok(method) = self.method(conversion) {
                let rendered = method.call_in(Some(self), &Args::new().bind(placeholder.clone()))?;
                let repr = match rendered {
                    Value::Str(repr) => repr,
                    other => other.to_string(),
                };
                return Ok(Value::Instance { class: self.name.clone(), repr });
            }
        }

        Ok(placeholder)
    }

    /// Calls `name` on `receiver`, which is bound as the first positional argument.
    pub fn invoke(&self, receiver: Value, name: &str, args: &Args) -> Result<Value, Error> {
        let method = self.method(name)?;
        method.call_in(Some(self), &args.bind(receiver))
    }

    /// Calls `name` on a fresh instance.
    pub fn call(&self, name: &str, args: &Args) -> Result<Value, Error> {
        let receiver = self.instance()?;
        self.invoke(receiver, name, args)
    }

    /// Calls `name` with the class itself as receiver.
    pub fn call_class(&self, name: &str, args: &Args) -> Result<Value, Error> {
        self.invoke(Value::class(self.name.clone()), name, args)
    }
}

pub type Decorator = Arc<dyn Fn(Function) -> Function + Send + Sync>;

/// Applies `decorator` to every attribute `skip` does not reject. Only the
/// given attributes are visited, so inherited ones are never touched.
pub fn apply_to_all<D, S>(attributes: Vec<(String, Attribute)>, decorator: D, skip: S) -> Vec<(String, Attribute)>
where
    D: Fn(Function) -> Function,
    S: Fn(&str, &Attribute) -> bool,
{
    attributes.into_iter()
        .map(|(name, attribute)| {
            if skip(&name, &attribute) {
                return (name, attribute);
            }

            match attribute {
                Attribute::Function(function) => (name, Attribute::Function(decorator(function))),
                other => (name, other),
            }
        })
        .collect()
}

/// Bulk decoration settings: which decorator, which names are denied, and
/// which functions opted out.
#[derive(Clone)]
pub struct Applier {
    decorator: Decorator,
    denylist: Vec<String>,
    opted_out: HashSet<String>,
}

impl Applier {
    pub fn new<D>(decorator: D) -> Self
    where
        D: Fn(Function) -> Function + Send + Sync + 'static,
    {
        Self {
            decorator: Arc::new(decorator),
            denylist: default_denylist(),
            opted_out: HashSet::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut applier = Self::default();
        applier.denylist = config.denylist.clone();
        applier
    }

    pub fn deny<N: Into<String>>(mut self, name: N) -> Self {
        self.denylist.push(name.into());
        self
    }

    /// Keeps `name` out of bulk decoration. It can still be wrapped by hand.
    pub fn opt_out<N: Into<String>>(mut self, name: N) -> Self {
        self.opted_out.insert(name.into());
        self
    }

    pub fn skips(&self, name: &str, attribute: &Attribute) -> bool {
        self.denylist.iter().any(|denied| denied == name)
            || self.opted_out.contains(name)
            || attribute.as_function().is_none()
    }

    pub fn apply(&self, attributes: Vec<(String, Attribute)>) -> Vec<(String, Attribute)> {
        apply_to_all(attributes, |function| (self.decorator)(function), |name, attribute| {
            self.skips(name, attribute)
        })
    }
}

impl Default for Applier {
    fn default() -> Self {
        Self::new(wrapper::footprint)
    }
}

impl Debug for Applier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Applier")
            .field("denylist", &self.denylist)
            .field("opted_out", &self.opted_out)
            .finish_non_exhaustive()
    }
}

/// Decorates a class that already exists.
pub fn footprint_class(class: Class, applier: &Applier) -> Class {
    Class {
        attributes: applier.apply(class.attributes),
        ..class
    }
}

/// Declares a [Class]. With [footprint_all](Self::footprint_all) or
/// [decorate_all](Self::decorate_all) the methods are decorated as the class
/// is built.
///
/// # Example
///
/// ```
/// use footprint::class::ClassBuilder;
/// use footprint::function::Function;
/// use footprint::record::Args;
/// use footprint::value::Value;
///
/// let class = ClassBuilder::new("shapes", "Square")
///     .method(Function::new("shapes", "side", |_| Ok(Value::from(2))).param("self").returns(true))
///     .footprint_all()
///     .build();
///
/// assert_eq!(class.call("side", &Args::new()).unwrap(), Value::from(2));
/// ```
pub struct ClassBuilder {
    module: String,
    name: String,
    attributes: Vec<(String, Attribute)>,
    base: Option<Arc<Class>>,
    opted_out: Vec<String>,
    applier: Option<Applier>,
}

impl ClassBuilder {
    pub fn new<M: Into<String>, N: Into<String>>(module: M, name: N) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            attributes: Vec::new(),
            base: None,
            opted_out: Vec::new(),
            applier: None,
        }
    }

    pub fn base(mut self, base: Arc<Class>) -> Self {
        self.base = Some(base);
        self
    }

    /// Declares `function` under its own name.
    pub fn method(self, function: Function) -> Self {
        let name = function.name().to_string();
        self.attr(name, Attribute::Function(function))
    }

    /// Declares `function` and keeps it out of bulk decoration.
    pub fn no_footprint(mut self, function: Function) -> Self {
        self.opted_out.push(function.name().to_string());
        self.method(function)
    }

    /// Declares `function` under another name, the way `__repr__ = __str__` aliases.
    pub fn alias<N: Into<String>>(self, name: N, function: &Function) -> Self {
        self.attr(name, Attribute::Function(function.clone()))
    }

    pub fn value<N: Into<String>, V: Into<Value>>(self, name: N, value: V) -> Self {
        self.attr(name, Attribute::Value(value.into()))
    }

    pub fn attr<N: Into<String>>(mut self, name: N, attribute: Attribute) -> Self {
        self.attributes.push((name.into(), attribute));
        self
    }

    pub fn footprint_all(self) -> Self {
        self.decorate_all(Applier::default())
    }

    pub fn decorate_all(mut self, applier: Applier) -> Self {
        self.applier = Some(applier);
        self
    }

    pub fn build(self) -> Class {
        let attributes = match self.applier {
            Some(applier) => {
                let applier = self.opted_out.into_iter()
                    .fold(applier, |applier, name| applier.opt_out(name));
                applier.apply(self.attributes)
            }
            None => self.attributes,
        };

        Class {
            module: self.module,
            name: self.name,
            attributes,
            base: self.base,
        }
    }
}
