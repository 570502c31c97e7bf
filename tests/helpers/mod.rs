//! Test helpers module
//!
//! This module provides utilities and helpers for testing group billing:
//! a PostgreSQL test database, in-memory host platform collaborators and a
//! unified test context.

#![allow(dead_code)]

pub mod database_helper;
pub mod fakes;
pub mod test_context;

pub use database_helper::*;
pub use fakes::*;
pub use test_context::*;
