//! crudcheck CLI library
//!
//! The `crudcheck` binary is a thin wrapper over these modules so that
//! the scenario suite and command reports can be exercised from tests.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod scenarios;
