use thiserror::Error as ThisError;
use crate::config::ConfigBuilderError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("cannot decorate a non-function value: {name}")]
    NotAFunction {
        name: String
    },

    #[error("Function {function} output is None!")]
    NoneReturned {
        function: String
    },

    #[error("{owner} has no attribute {name}")]
    NoSuchAttribute {
        owner: String,
        name: String
    },

    #[error(transparent)]
    Raised(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid footprint configuration: {0}")]
    Config(#[from] ConfigBuilderError),
}

impl Error {
    /// Wraps any error raised from a function body so it can travel through
    /// the wrapper untouched.
    pub fn raised<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Raised(Box::new(error))
    }
}
