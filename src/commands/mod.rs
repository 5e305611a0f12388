//! Subcommand handlers. Output goes to the writer passed in; diagnostics go
//! through `tracing`.

pub mod ftp;
pub mod session;
