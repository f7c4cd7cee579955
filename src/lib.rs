//! JSON-driven modular installer.
//!
//! Installs, tracks and removes named modules (bundles of files, merged JSON
//! fragments, hook registrations and setup commands) into an install
//! directory, driven by a single configuration document.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: parse and validate the configuration document
//! - **[`resources`]**: filesystem, JSON and settings-document primitives
//! - **[`engine`]**: operation executor, hook merger, status ledger, rollback and module runner
//! - **[`commands`]**: top-level orchestration (`install`, `uninstall`, `status`, interactive)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod resources;
