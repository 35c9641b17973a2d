use derive_builder::Builder;
use log::Level;

pub const DEFAULT_INDENT_STEP: usize = 4;
pub const DEFAULT_TARGET: &str = "footprint";

/// Methods that are never wrapped by bulk application. Wrapping the string
/// conversion methods would recurse, since rendering a receiver calls them.
pub const DEFAULT_DENYLIST: &[&str] = &["fmt", "to_string", "__str__", "__repr__"];

/// Settings shared by every line a [LogContext](crate::log::LogContext) writes.
///
/// # Example
///
/// ```
/// use footprint::config::ConfigBuilder;
///
/// let config = ConfigBuilder::default()
///     .indent_step(2usize)
///     .build()
///     .expect("could not build footprint config");
/// assert_eq!(config.indent_step, 2);
/// assert_eq!(config.target, "footprint");
/// ```
#[derive(Builder, Clone, Debug)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Config {
    #[builder(default = "DEFAULT_INDENT_STEP")]
    pub indent_step: usize,

    // level of the CALL/END lines
    #[builder(default = "Level::Info")]
    pub level: Level,

    #[builder(default = "DEFAULT_TARGET.to_string()")]
    pub target: String,

    #[builder(default = "default_denylist()")]
    pub denylist: Vec<String>,
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.target {
            Some(target) if target.is_empty() => Err("target must not be empty".to_string()),
            _ => Ok(()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent_step: DEFAULT_INDENT_STEP,
            level: Level::Info,
            target: DEFAULT_TARGET.to_string(),
            denylist: default_denylist(),
        }
    }
}

pub fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|name| name.to_string()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let built = ConfigBuilder::default().build().unwrap();
        let default = Config::default();

        assert_eq!(built.indent_step, default.indent_step);
        assert_eq!(built.level, default.level);
        assert_eq!(built.target, default.target);
        assert_eq!(built.denylist, default.denylist);
    }

    #[test]
    fn builder_overrides() {
        let config = ConfigBuilder::default()
            .indent_step(2usize)
            .level(Level::Debug)
            .denylist(vec!["fmt".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.indent_step, 2);
        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.denylist, vec!["fmt".to_string()]);
    }

    #[test]
    fn empty_target_is_rejected() {
        let error = ConfigBuilder::default().target("").build().unwrap_err();
        assert!(matches!(error, ConfigBuilderError::ValidationError(_)));
    }
}
