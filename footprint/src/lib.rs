//! Call logging for functions and methods.
//!
//! Every wrapped call logs a `CALL` header with its argument values, indents
//! everything logged while it runs, and logs an `END` line (with the returned
//! value when there is one) on the way out.
//!
//! ```
//! use footprint::footprint;
//!
//! #[footprint]
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! // CALL <module>.add (a = 1
//! //                    b = 2)
//! //     END <module>.add -> 3
//! assert_eq!(add(1, 2), 3);
//! ```

extern crate self as footprint;

// library public modules :
pub mod config;
pub mod errors;
pub mod log;
pub mod value;
pub mod record;
pub mod returns;
pub mod function;
pub mod wrapper;
pub mod class;

pub use footprint_macro::{footprint, footprint_all, no_footprint, not_none};

pub use crate::class::{apply_to_all, footprint_class, Applier, Attribute, Class, ClassBuilder};
pub use crate::errors::Error;
pub use crate::log::{context, LogContext};
pub use crate::record::{Args, CallRecord, Param};
pub use crate::value::Value;
pub use crate::wrapper::{wrap, Call};

#[doc(hidden)]
pub mod __private {
    pub use crate::value::{DebugValue, DisplayValue, OpaqueValue, Probe, StrValue, short_type_name};
}
