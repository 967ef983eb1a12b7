//! Error handling and result types for depfresh.
//!
//! Provides a unified error handling approach using the `color-eyre` crate,
//! which offers enhanced error reporting with context and colored output.
//! Fallible functions across the crate return the `Result<T>` defined here.

use color_eyre::eyre::Result as EyreResult;

/// Standard result type used throughout depfresh.
///
/// Type alias for `color_eyre::eyre::Result<T>`. Contexts can be chained
/// onto errors as they propagate using `.wrap_err()`:
///
/// ```rust,ignore
/// use crate::result::Result;
/// use color_eyre::eyre::Context;
///
/// fn read_manifest(path: &str) -> Result<String> {
///     std::fs::read_to_string(path)
///         .wrap_err("failed to read manifest file")
/// }
/// ```
pub type Result<T> = EyreResult<T>;
