//! Shared configuration, constants and error types for the Praetor workspace.

pub mod config;
pub mod constants;
pub mod error;
