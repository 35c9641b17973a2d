use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::class::Class;
use crate::errors::Error;
use crate::record::{Args, Param};
use crate::returns;
use crate::value::Value;

/// Identity of a [Function]. Clones share it, wrapping produces a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId(u64);

impl FunctionId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        FunctionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

pub type Body = Arc<dyn Fn(&Frame<'_>) -> Result<Value, Error> + Send + Sync>;

/// What a function body sees while it runs.
pub struct Frame<'a> {
    pub args: &'a Args,
    owner: Option<&'a Class>,
}

impl<'a> Frame<'a> {
    pub fn new(args: &'a Args) -> Self {
        Self { args, owner: None }
    }

    pub(crate) fn with_owner(args: &'a Args, owner: Option<&'a Class>) -> Self {
        Self { args, owner }
    }

    pub fn owner(&self) -> Option<&'a Class> {
        self.owner
    }

    pub fn arg(&self, position: usize) -> Option<&Value> {
        self.args.positional.get(position)
    }

    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.args.keywords.iter()
            .find(|(keyword, _)| keyword == name)
            .map(|(_, value)| value)
    }

    /// The bound instance (or type) of a method call.
    pub fn receiver(&self) -> Option<&Value> {
        self.owner.and(self.arg(0))
    }

    /// Calls another method of the same owner on the same receiver.
    pub fn call_method(&self, name: &str, args: Args) -> Result<Value, Error> {
        match (self.owner, self.receiver()) {
            (Some(owner), Some(receiver)) => owner.invoke(receiver.clone(), name, &args),
            _ => Err(Error::NoSuchAttribute {
                owner: "<unbound>".to_string(),
                name: name.to_string()
            }),
        }
    }
}

/// A callable the runtime wrapper can decorate: a name, its declared
/// parameters and a body.
#[derive(Clone)]
pub struct Function {
    id: FunctionId,
    module: String,
    name: String,
    params: Vec<Param>,
    returns: bool,
    body: Body,
}

impl Function {
    pub fn new<M, N, F>(module: M, name: N, body: F) -> Self
    where
        M: Into<String>,
        N: Into<String>,
        F: Fn(&Frame<'_>) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self {
            id: FunctionId::next(),
            module: module.into(),
            name: name.into(),
            params: Vec::new(),
            returns: false,
            body: Arc::new(body),
        }
    }

    pub fn param<N: Into<String>>(mut self, name: N) -> Self {
        self.params.push(Param::new(name));
        self
    }

    pub fn param_default<N: Into<String>, V: Into<Value>>(mut self, name: N, default: V) -> Self {
        self.params.push(Param::with_default(name, default));
        self
    }

    /// Declares whether the function produces a value worth logging.
    pub fn returns(mut self, returns: bool) -> Self {
        self.returns = returns;
        self
    }

    /// Decides [returns](Self::returns) by scanning `source` for a return statement.
    pub fn with_source(mut self, source: &str) -> Self {
        self.returns = returns::has_return_statement(self.id, source);
        self
    }

    /// Same name, parameters and return declaration, new body and identity.
    pub fn with_body<F>(&self, body: F) -> Self
    where
        F: Fn(&Frame<'_>) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self {
            id: FunctionId::next(),
            module: self.module.clone(),
            name: self.name.clone(),
            params: self.params.clone(),
            returns: self.returns,
            body: Arc::new(body),
        }
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn has_return(&self) -> bool {
        self.returns
    }

    pub fn call(&self, args: &Args) -> Result<Value, Error> {
        (self.body)(&Frame::new(args))
    }

    pub fn call_in(&self, owner: Option<&Class>, args: &Args) -> Result<Value, Error> {
        (self.body)(&Frame::with_owner(args, owner))
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("id", &self.id)
            .field("module", &self.module)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn call_passes_arguments_through() {
        let add = Function::new("math", "add", |frame| {
            let left = frame.arg(0).cloned().unwrap_or(Value::None);
            let right = frame.kwarg("right").cloned().unwrap_or(Value::None);
            Ok(Value::Repr(format!("{}+{}", left, right)))
        });

        let result = add.call(&Args::new().arg(1).kwarg("right", 2)).unwrap();
        assert_eq!(result, Value::Repr("1+2".to_string()));
    }

    #[test]
    fn with_body_keeps_the_declaration() {
        let original = Function::new("m", "f", |_| Ok(Value::None))
            .param("a")
            .param_default("b", 1)
            .returns(true);
        let replaced = original.with_body(|_| Ok(Value::from(5)));

        assert_ne!(original.id(), replaced.id());
        assert_eq!(replaced.name(), "f");
        assert_eq!(replaced.params(), original.params());
        assert!(replaced.has_return());
        assert_eq!(replaced.call(&Args::new()).unwrap(), Value::from(5));
    }

    #[test]
    fn with_source_detects_return() {
        let with = Function::new("m", "f", |_| Ok(Value::None))
            .with_source("def f():\n    return 1");
        let without = Function::new("m", "g", |_| Ok(Value::None))
            .with_source("def g():\n    pass");

        assert!(with.has_return());
        assert!(!without.has_return());
    }

    #[test]
    fn unbound_frame_cannot_call_methods() {
        let args = Args::new();
        let frame = Frame::new(&args);

        assert!(frame.receiver().is_none());
        assert!(matches!(
            frame.call_method("aj", Args::new()),
            Err(Error::NoSuchAttribute { .. })
        ));
    }
}
