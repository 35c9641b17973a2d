use crate::class::Attribute;
use crate::errors::Error;
use crate::function::Function;
use crate::log;
use crate::record::CallRecord;
use crate::value::Value;

/// Everything needed to log one call: who was called and with what.
///
/// The attribute macros build one of these at the top of every wrapped
/// function; the runtime [footprint] builds it from a [CallRecord].
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    module: String,
    function: String,
    owner: Option<String>,
    record: CallRecord,
    returns: bool,
}

impl Call {
    pub fn new<M: Into<String>, F: Into<String>>(module: M, function: F) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
            owner: None,
            record: CallRecord::new(),
            returns: false,
        }
    }

    /// Type the function is declared on, when no `self`/`cls` entry names it.
    pub fn owner<O: Into<String>>(mut self, owner: O) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn arg(mut self, name: &str, value: Value) -> Self {
        self.record.push(name, value);
        self
    }

    pub fn record(mut self, record: CallRecord) -> Self {
        self.record = record;
        self
    }

    pub fn returning(mut self, returns: bool) -> Self {
        self.returns = returns;
        self
    }

    pub fn returns(&self) -> bool {
        self.returns
    }

    pub fn entries(&self) -> &CallRecord {
        &self.record
    }

    /// `module.Type.function` for methods, `module.function` otherwise.
    ///
    /// The type comes from a `self` or `cls` entry that names one, then from
    /// [Call::owner]. A receiver bound to a plain value names nothing, so
    /// without an owner the call reads as a free function.
    pub fn display_name(&self) -> String {
        let module = self.module.replace("::", ".");

        let owner = self.record.get("self").and_then(Value::owner)
            .or_else(|| self.record.get("cls").and_then(Value::owner))
            .or(self.owner.as_deref());

        match owner {
            Some(owner) => format!("{}.{}.{}", module, owner, self.function),
            None => format!("{}.{}", module, self.function),
        }
    }

    /// The CALL block: one line per recorded parameter, continuation lines
    /// aligned under the opening parenthesis.
    pub fn header_lines(&self, name: &str) -> Vec<String> {
        let opening = format!("CALL {} (", name);
        let entries: Vec<(&str, &Value)> = self.record.iter().collect();

        match entries.as_slice() {
            [] => vec![format!("{})", opening)],
            [(param, value)] => vec![format!("{}{} = {})", opening, param, value)],
            [(first, first_value), middle @ .., (last, last_value)] => {
                let padding = " ".repeat(opening.chars().count());
                let mut lines = Vec::with_capacity(entries.len());

                lines.push(format!("{}{} = {}", opening, first, first_value));
                for (param, value) in middle {
                    lines.push(format!("{}{} = {}", padding, param, value));
                }
                lines.push(format!("{}{} = {})", padding, last, last_value));

                lines
            }
        }
    }
}

/// Wraps `function` so every call logs its arguments and, if it returns a
/// value, its result. Errors from the body are returned untouched; the
/// indentation is released either way.
pub fn footprint(function: Function) -> Function {
    let inner = function.clone();

    function.with_body(move |frame| {
        let mut call = Call::new(inner.module(), inner.name())
            .record(CallRecord::resolve(inner.params(), frame.args))
            .returning(inner.has_return());
        if let Some(class) = frame.owner() {
            call = call.owner(class.name());
        }

        let ctx = log::context();
        let footprint = ctx.enter(&call);
        let result = inner.call_in(frame.owner(), frame.args)?;
        footprint.exit(Some(result.clone()));

        Ok(result)
    })
}

/// [footprint] for an arbitrary attribute; anything but a function is refused.
pub fn wrap(attribute: Attribute) -> Result<Function, Error> {
    match attribute {
        Attribute::Function(function) => Ok(footprint(function)),
        Attribute::Value(value) => Err(Error::NotAFunction { name: value.to_string() }),
    }
}

/// Wraps `function` so a `None` result becomes [Error::NoneReturned].
pub fn not_none(function: Function) -> Function {
    let inner = function.clone();

    function.with_body(move |frame| {
        let result = inner.call_in(frame.owner(), frame.args)?;
        if result.is_none() {
            return Err(Error::NoneReturned { function: inner.name().to_string() });
        }

        Ok(result)
    })
}
