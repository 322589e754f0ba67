//! Diagnostics for semantic resolution.
//!
//! Every reported failure becomes one [`Diagnostic`]: a stable
//! [`ErrorCode`], a message, a primary label at the failing node and
//! secondary labels for related declarations (for example each candidate of
//! an ambiguous call).

mod diagnostic;
mod error_code;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
