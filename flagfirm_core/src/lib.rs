//! Flagfirm Core - compiler and linker flag validation engine
//!
//! Decides whether untrusted compiler and linker flags (package directives,
//! environment variables) are safe to hand to the native toolchain. A flag is
//! accepted only when an operator override or a built-in catalog entry
//! matches all of it; the first flag that nothing accepts rejects the whole
//! list.
//!
//! ```rust,no_run
//! use flagfirm_core::{Check, FlagValidator, RealEnvironment};
//!
//! # fn main() -> flagfirm_core::Result<()> {
//! let env = RealEnvironment;
//! let validator = FlagValidator::new(&env)?;
//! validator.check_flags(Check::Cflags, "#cgo CFLAGS directive", &["-O2", "-DNDEBUG"])?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod env;
pub mod errors;
pub mod overrides;
pub mod safe_arg;
pub mod validator;

pub use catalog::{validate_catalog, Catalog, CatalogEntry, Check, FlagPattern, Rule, Tool};
pub use env::{Environment, MockEnvironment, RealEnvironment};
pub use errors::{Error, Result};
pub use overrides::{override_key, OverrideKind, Overrides, DEFAULT_PREFIX};
pub use safe_arg::{PositionalArg, SafeArg};
pub use validator::{FlagValidator, RejectReason, Rejection, ValidationOutcome};
