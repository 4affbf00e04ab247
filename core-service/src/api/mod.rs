//! API Module
//!
//! Command layer between the CLI entry point and the logic engines.
//!
//! Structure:
//! - commands.rs: one function per `deepsecure` subcommand

pub mod commands;
