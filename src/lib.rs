//! pollexec: the library
//!
//! Polls a set of paths for the most recent modification time and re-runs a
//! command whenever something newer turns up. The binary is a thin wrapper
//! around [`run`]; the pieces are public so the loop can be driven with a
//! custom [`run::Handler`].

#![deny(unsafe_code, clippy::missing_const_for_fn)]
#![allow(clippy::default_trait_access, clippy::cognitive_complexity)]

#[macro_use]
extern crate clap;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod filter;
pub mod process;
pub mod run;
pub mod scan;
pub mod signal;

pub use run::run;
