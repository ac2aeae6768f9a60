//! HTTP surface of the Praetor authorization service.

pub mod app;
pub mod catalog;
pub mod config;
pub mod db_handler;
pub mod error;
pub mod middleware;
