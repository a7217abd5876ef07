//! # CodeCamp Common Library
//!
//! Shared code for the CodeCamp service crates:
//! - Entity model (camps, embedded locations, talks, speakers)
//! - Database schema initialization
//! - Bootstrap configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use db::models::{Camp, Location, Speaker, Talk};
pub use error::{Error, Result};
