//! Subcommand implementations.

pub mod collect;
pub mod convert;
pub mod header;
pub mod measure;
