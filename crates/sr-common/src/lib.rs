//! Shared runtime plumbing for registry binaries.

pub mod logging;
