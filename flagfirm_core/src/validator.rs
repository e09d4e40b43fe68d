//! Compiler and linker flag validation
//!
//! Flags such as `-fplugin=` can run arbitrary code during a build, GNU
//! binutils read more flags from any argument that starts with `@`, and
//! `gcc -I@foo` reaches `cc1` as `-I @foo`. So a flag is accepted only when
//! something explicitly allows it, and anything that may end up as its own
//! argument must not start with `@` or `-`.
//!
//! `-Wl,a,b` hands `a` and `b` to the linker as separate arguments. Every
//! `-Wl,` shape accepted here is enumerated and keeps commas out of its
//! wildcards.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    catalog::{Catalog, Check},
    env::Environment,
    overrides::{override_key, OverrideKind, Overrides, DEFAULT_PREFIX},
    safe_arg::{PositionalArg, SafeArg},
    Error, Result,
};

/// Prefix shared by a flag and its argument in `-Wl,-framework -Wl,Name`.
const LINKER_PASS_THROUGH: &str = "-Wl,";

/// Why a flag was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Matched the disallow override.
    Disallowed,
    /// Nothing accepts the flag.
    NotAllowed,
    /// The flag takes an argument, but the following token is not safe.
    UnsafeArgument,
    /// The flag takes an argument and is the last token.
    MissingArgument,
}

/// The first offending flag of a rejected list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Where the flags came from, e.g. `#cgo CFLAGS directive`.
    pub source: String,
    pub check: Check,
    /// Position of `flag` in the list.
    pub index: usize,
    pub flag: String,
    /// The token after `flag`, when the pair was judged together.
    pub next: Option<String>,
    pub reason: RejectReason,
    /// Configuration key that can allow the flag.
    pub remedy: String,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid flag in {}: {}", self.source, self.flag)?;
        match (&self.reason, &self.next) {
            (RejectReason::MissingArgument, _) => f.write_str(" without argument")?,
            (_, Some(next)) => write!(f, " {next}")?,
            (_, None) => {}
        }
        write!(f, " (see ${})", self.remedy)
    }
}

/// Result of validating one flag list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Accepted,
    Rejected(Rejection),
}

impl ValidationOutcome {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }

    /// Turn a rejection into an error.
    ///
    /// # Errors
    /// [`Error::MissingArgument`] or [`Error::InvalidFlag`] when rejected
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Accepted => Ok(()),
            Self::Rejected(rejection) if rejection.reason == RejectReason::MissingArgument => {
                Err(Error::MissingArgument(Box::new(rejection)))
            }
            Self::Rejected(rejection) => Err(Error::InvalidFlag(Box::new(rejection))),
        }
    }
}

/// Validates flag lists against the catalog and the configured overrides.
///
/// Holds only shared references, so one validator can serve many threads.
pub struct FlagValidator<'a> {
    catalog: &'a Catalog,
    env: &'a dyn Environment,
    safe_arg: &'a dyn SafeArg,
    prefix: String,
}

impl<'a> FlagValidator<'a> {
    /// Validator over the built-in catalog, with `CGO_*` overrides and the
    /// [`PositionalArg`] predicate.
    ///
    /// # Errors
    /// when the built-in catalog cannot be loaded
    pub fn new(env: &'a dyn Environment) -> Result<Self> {
        Ok(Self::with_catalog(Catalog::builtin()?, env))
    }

    #[must_use]
    pub fn with_catalog(catalog: &'a Catalog, env: &'a dyn Environment) -> Self {
        Self {
            catalog,
            env,
            safe_arg: &PositionalArg,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    #[must_use]
    pub fn with_safe_arg(mut self, safe_arg: &'a dyn SafeArg) -> Self {
        self.safe_arg = safe_arg;
        self
    }

    /// Read overrides from `<prefix>_<CHECK>_ALLOW` / `_DISALLOW`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Validate `flags` for `check`, stopping at the first offending flag.
    ///
    /// `source` only labels the rejection. Overrides are read from the
    /// environment on every call.
    ///
    /// # Errors
    /// [`Error::Config`] when an override pattern does not compile
    pub fn validate<S: AsRef<str>>(
        &self,
        check: Check,
        source: &str,
        flags: &[S],
    ) -> Result<ValidationOutcome> {
        let overrides = Overrides::resolve(&self.prefix, check, self.env)?;
        let tool = check.tool();
        let reject = |index: usize, next: Option<&str>, reason: RejectReason| {
            let rejection = Rejection {
                source: source.to_string(),
                check,
                index,
                flag: flags[index].as_ref().to_string(),
                next: next.map(str::to_string),
                reason,
                remedy: override_key(&self.prefix, check, OverrideKind::Allow),
            };
            debug!(%check, source, index, flag = %rejection.flag, ?reason, "flag rejected");
            ValidationOutcome::Rejected(rejection)
        };

        let mut i = 0;
        while i < flags.len() {
            let flag = flags[i].as_ref();
            let next = flags.get(i + 1).map(AsRef::as_ref);

            if overrides.is_disallowed(flag) {
                return Ok(reject(i, None, RejectReason::Disallowed));
            }
            if overrides.is_allowed(flag) {
                trace!(%check, flag, "allowed by override");
                i += 1;
                continue;
            }
            if let Some(entry) = self.catalog.matching_entry(tool, flag) {
                trace!(%check, flag, id = %entry.id, "allowed by catalog");
                i += 1;
                continue;
            }
            if !self.catalog.takes_arg(tool, flag) {
                return Ok(reject(i, None, RejectReason::NotAllowed));
            }

            match next {
                Some(arg) if self.safe_arg.is_safe(arg) || self.is_linker_pair(flag, arg) => {
                    trace!(%check, flag, arg, "allowed with argument");
                    i += 2;
                }
                Some(arg) => return Ok(reject(i, Some(arg), RejectReason::UnsafeArgument)),
                None => return Ok(reject(i, None, RejectReason::MissingArgument)),
            }
        }

        Ok(ValidationOutcome::Accepted)
    }

    /// Like [`Self::validate`], but a rejection is an error, so callers can
    /// stop before invoking the toolchain with `?`.
    ///
    /// # Errors
    /// [`Error::Config`], [`Error::InvalidFlag`] or [`Error::MissingArgument`]
    pub fn check_flags<S: AsRef<str>>(&self, check: Check, source: &str, flags: &[S]) -> Result<()> {
        self.validate(check, source, flags)?.into_result()
    }

    /// `-Wl,-framework -Wl,Name`: the argument is only accepted when it is a
    /// single linker argument.
    fn is_linker_pair(&self, flag: &str, arg: &str) -> bool {
        if !flag.starts_with(LINKER_PASS_THROUGH) {
            return false;
        }
        arg.strip_prefix(LINKER_PASS_THROUGH)
            .is_some_and(|inner| self.safe_arg.is_safe(inner) && !inner.contains(','))
    }
}
