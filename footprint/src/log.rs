use std::cell::RefCell;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use lazy_static::lazy_static;
use log::Level;

use crate::config::{Config, ConfigBuilder};
use crate::errors::Error;
use crate::wrapper::Call;
use crate::value::Value;

/// Where finished lines go. A line already carries its indentation.
pub trait Sink: Send + Sync {
    fn emit(&self, level: Level, line: &str);
}

/// Forwards every line to the `log` crate.
pub struct LogSink {
    target: String,
}

impl LogSink {
    pub fn new<T: Into<String>>(target: T) -> Self {
        Self { target: target.into() }
    }
}

impl Sink for LogSink {
    fn emit(&self, level: Level, line: &str) {
        log::log!(target: self.target.as_str(), level, "{}", line);
    }
}

/// Keeps every emitted line in memory. Clones share the same buffer, so a
/// test can hand one clone to a context and read from the other.
#[cfg(any(test, feature = "test_utils"))]
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<std::sync::Mutex<Vec<(Level, String)>>>,
}

#[cfg(any(test, feature = "test_utils"))]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.records().into_iter().map(|(_, line)| line).collect()
    }

    pub fn clear(&self) {
        match self.lines.lock() {
            Ok(mut lines) => lines.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

#[cfg(any(test, feature = "test_utils"))]
impl Sink for MemorySink {
    fn emit(&self, level: Level, line: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push((level, line.to_string())),
            Err(poisoned) => poisoned.into_inner().push((level, line.to_string())),
        }
    }
}

/// The logging façade: leveled emission plus the shared indent depth.
///
/// Every line is prefixed with `depth * indent_step` spaces. Depth never goes
/// below zero. The leveled methods return `&Self` so calls can be chained:
///
/// ```
/// use footprint::log::LogContext;
///
/// let ctx = LogContext::default();
/// ctx.indent().info("nested").unindent();
/// assert_eq!(ctx.depth(), 0);
/// ```
pub struct LogContext {
    config: Config,
    depth: AtomicUsize,
    sink: Box<dyn Sink>,
}

impl LogContext {
    pub fn new<S: Sink + 'static>(config: Config, sink: S) -> Self {
        Self {
            config,
            depth: AtomicUsize::new(0),
            sink: Box::new(sink),
        }
    }

    /// Builds the configuration first, so a bad builder surfaces as [Error::Config].
    pub fn configured(builder: &ConfigBuilder) -> Result<Self, Error> {
        Ok(Self::with_config(builder.build()?))
    }

    pub fn with_config(config: Config) -> Self {
        let sink = LogSink::new(config.target.clone());
        Self::new(config, sink)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Width of the current indentation, in characters.
    pub fn indent_size(&self) -> usize {
        self.depth() * self.config.indent_step
    }

    pub fn indent(&self) -> &Self {
        self.depth.fetch_add(1, Ordering::SeqCst);
        self
    }

    pub fn unindent(&self) -> &Self {
        let _ = self.depth.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| {
            depth.checked_sub(1)
        });
        self
    }

    /// Indents until the returned guard is dropped.
    pub fn indented(&self) -> IndentGuard<'_> {
        self.indent();
        IndentGuard { ctx: self }
    }

    pub fn log<M: Display>(&self, level: Level, message: M) -> &Self {
        let line = format!("{}{}", " ".repeat(self.indent_size()), message);
        self.sink.emit(level, &line);
        self
    }

    pub fn info<M: Display>(&self, message: M) -> &Self {
        self.log(Level::Info, message)
    }

    pub fn debug<M: Display>(&self, message: M) -> &Self {
        self.log(Level::Debug, message)
    }

    pub fn warning<M: Display>(&self, message: M) -> &Self {
        self.log(Level::Warn, message)
    }

    pub fn error<M: Display>(&self, message: M) -> &Self {
        self.log(Level::Error, message)
    }

    pub fn blank(&self) -> &Self {
        self.log(Level::Info, "")
    }

    /// Logs the CALL header for `call` and indents until the returned
    /// [Footprint] is finished or dropped.
    pub fn enter(&self, call: &Call) -> Footprint<'_> {
        let name = call.display_name();
        for line in call.header_lines(&name) {
            self.log(self.config.level, line);
        }

        Footprint {
            name,
            returns: call.returns(),
            guard: self.indented(),
        }
    }

    /// Runs `f` with this context installed as the current one on this thread.
    pub fn scope<F, R>(self: &Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT.with(|current| current.borrow_mut().push(Arc::clone(self)));
        let _installed = Installed;
        f()
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

pub struct IndentGuard<'a> {
    ctx: &'a LogContext,
}

impl IndentGuard<'_> {
    pub fn ctx(&self) -> &LogContext {
        self.ctx
    }
}

impl Drop for IndentGuard<'_> {
    fn drop(&mut self) {
        self.ctx.unindent();
    }
}

/// One call in progress. Finishing it logs the END line at the inner depth,
/// then the indentation is released. Dropping it without finishing (an error
/// or a panic unwinding through the wrapper) only releases the indentation.
pub struct Footprint<'a> {
    name: String,
    returns: bool,
    guard: IndentGuard<'a>,
}

impl Footprint<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logs `END <name> -> <value>` when the call returns a value, otherwise `END <name>`.
    pub fn exit(self, result: Option<Value>) {
        let ctx = self.guard.ctx();
        match (self.returns, result) {
            (true, Some(value)) => ctx.log(ctx.config.level, format!("END {} -> {}", self.name, value)),
            (true, None) => ctx.log(ctx.config.level, format!("END {} -> {}", self.name, Value::None)),
            (false, _) => ctx.log(ctx.config.level, format!("END {}", self.name)),
        };
    }
}

lazy_static! {
    static ref GLOBAL: Arc<LogContext> = Arc::new(LogContext::default());
}

thread_local! {
    static CURRENT: RefCell<Vec<Arc<LogContext>>> = const { RefCell::new(Vec::new()) };
}

struct Installed;

impl Drop for Installed {
    fn drop(&mut self) {
        CURRENT.with(|current| current.borrow_mut().pop());
    }
}

/// The context wrapped functions log to: the innermost one installed with
/// [LogContext::scope] on this thread, or the process-wide default.
pub fn context() -> Arc<LogContext> {
    CURRENT.with(|current| current.borrow().last().cloned())
        .unwrap_or_else(|| Arc::clone(&GLOBAL))
}

pub fn info<M: Display>(message: M) {
    context().info(message);
}

pub fn debug<M: Display>(message: M) {
    context().debug(message);
}

pub fn warning<M: Display>(message: M) {
    context().warning(message);
}

pub fn error<M: Display>(message: M) {
    context().error(message);
}

pub fn blank() {
    context().blank();
}

pub fn indent() {
    context().indent();
}

pub fn unindent() {
    context().unindent();
}

pub fn indent_size() -> usize {
    context().indent_size()
}

#[cfg(test)]
mod test {
    use super::*;

    fn memory_context(step: usize) -> (LogContext, MemorySink) {
        let sink = MemorySink::new();
        let config = ConfigBuilder::default().indent_step(step).build().unwrap();
        (LogContext::new(config, sink.clone()), sink)
    }

    #[test]
    fn configured_reports_builder_errors() {
        let ctx = LogContext::configured(ConfigBuilder::default().indent_step(2usize)).unwrap();
        assert_eq!(ctx.config().indent_step, 2);

        let error = LogContext::configured(ConfigBuilder::default().target("")).err().unwrap();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn lines_are_prefixed_with_indent() {
        let (ctx, sink) = memory_context(4);

        ctx.info("zero").indent().debug("one").indent().warning("two");
        ctx.unindent().error("back").blank();

        assert_eq!(sink.lines(), vec!["zero", "    one", "        two", "    back", "    "]);
        assert_eq!(sink.records()[2].0, Level::Warn);
        assert_eq!(sink.records()[3].0, Level::Error);
    }

    #[test]
    fn depth_never_goes_negative() {
        let (ctx, _) = memory_context(4);

        ctx.unindent().unindent();
        assert_eq!(ctx.depth(), 0);

        ctx.indent();
        ctx.unindent().unindent().unindent();
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.indent_size(), 0);
    }

    #[test]
    fn guard_releases_indent() {
        let (ctx, _) = memory_context(3);
        {
            let _outer = ctx.indented();
            let _inner = ctx.indented();
            assert_eq!(ctx.indent_size(), 6);
        }
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn scope_installs_and_restores_context() {
        let sink = MemorySink::new();
        let ctx = Arc::new(LogContext::new(Config::default(), sink.clone()));

        ctx.scope(|| {
            info("inside");
            indent();
            debug("deeper");
            assert_eq!(indent_size(), 4);
            unindent();
        });
        info("outside");

        assert_eq!(sink.lines(), vec!["inside", "    deeper"]);
        assert!(!Arc::ptr_eq(&context(), &ctx));
    }
}
