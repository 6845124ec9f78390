//! stratscan: indicator-driven strategy backtester and market scanner.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line front end in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
