#![allow(dead_code)]

use std::sync::Arc;
use footprint::config::ConfigBuilder;
use footprint::log::{LogContext, MemorySink};

/// Runs `f` against a fresh in-memory context and returns what it logged
/// along with the depth the context was left at.
pub fn capture<F, R>(f: F) -> (R, Vec<String>, usize)
where
    F: FnOnce() -> R,
{
    let sink = MemorySink::new();
    let config = ConfigBuilder::default().build().expect("could not build config");
    let ctx = Arc::new(LogContext::new(config, sink.clone()));

    let result = ctx.scope(f);
    (result, sink.lines(), ctx.depth())
}

pub fn lines<F: FnOnce()>(f: F) -> Vec<String> {
    capture(f).1
}

/// `module_path!()` the way it shows up in log lines.
pub fn dotted(module: &str) -> String {
    module.replace("::", ".")
}
