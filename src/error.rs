//! Diagnostic error types for donext.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text so users know exactly what
//! went wrong and how to fix it. This module aggregates them, preserving
//! the full diagnostic chain through to the user.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::generate::GenerateError;
use crate::ops::OpsError;
use crate::paths::PathError;
use crate::store::StoreError;

/// Top-level error type for donext.
#[derive(Debug, Error, Diagnostic)]
pub enum DonextError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ops(#[from] OpsError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for functions returning donext results.
pub type DonextResult<T> = std::result::Result<T, DonextError>;
