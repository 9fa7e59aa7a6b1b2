//! Kernel-wide constants.

/// Kernel name used in startup logging
pub const KERNEL_NAME: &str = "crucible";

/// Kernel version from Cargo.toml
pub const KERNEL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Root log target; component targets are `{LOG_TARGET}::{name}`
pub const LOG_TARGET: &str = "crucible";
