//! Operator overrides of the built-in catalog
//!
//! Each check can be widened with `<PREFIX>_<CHECK>_ALLOW` and narrowed with
//! `<PREFIX>_<CHECK>_DISALLOW`, e.g. `CGO_CFLAGS_ALLOW='-fplugin=.*'`. Both
//! values are patterns that must match a whole flag, just like catalog
//! entries.

use strum::{AsRefStr, Display};
use tracing::debug;

use crate::{catalog::Check, catalog::FlagPattern, env::Environment, Error, Result};

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "CGO";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum OverrideKind {
    Allow,
    Disallow,
}

/// Name of the configuration key holding one override, e.g.
/// `CGO_LDFLAGS_DISALLOW`.
#[must_use]
pub fn override_key(prefix: &str, check: Check, kind: OverrideKind) -> String {
    format!("{prefix}_{check}_{kind}")
}

/// Allow and disallow patterns for one check.
///
/// Built fresh for every validation call and dropped with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub allow: Option<FlagPattern>,
    pub disallow: Option<FlagPattern>,
}

impl Overrides {
    /// Read and compile both override patterns of `check` from `env`.
    ///
    /// A missing or empty value leaves that override unset.
    ///
    /// # Errors
    /// [`Error::Config`] when a configured value is not a valid pattern
    pub fn resolve(prefix: &str, check: Check, env: &dyn Environment) -> Result<Self> {
        Ok(Self {
            allow: load(prefix, check, OverrideKind::Allow, env)?,
            disallow: load(prefix, check, OverrideKind::Disallow, env)?,
        })
    }

    #[must_use]
    pub fn is_disallowed(&self, flag: &str) -> bool {
        self.disallow
            .as_ref()
            .is_some_and(|pattern| pattern.is_full_match(flag))
    }

    #[must_use]
    pub fn is_allowed(&self, flag: &str) -> bool {
        self.allow
            .as_ref()
            .is_some_and(|pattern| pattern.is_full_match(flag))
    }
}

fn load(
    prefix: &str,
    check: Check,
    kind: OverrideKind,
    env: &dyn Environment,
) -> Result<Option<FlagPattern>> {
    let key = override_key(prefix, check, kind);
    let Some(value) = env.var(&key).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    debug!(key = %key, pattern = %value, "override configured");
    FlagPattern::new(&value)
        .map(Some)
        .map_err(|source| Error::Config { check, key, source })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::env::MockEnvironment;

    #[rstest]
    #[case("CGO", Check::Cflags, OverrideKind::Allow, "CGO_CFLAGS_ALLOW")]
    #[case("CGO", Check::Ldflags, OverrideKind::Disallow, "CGO_LDFLAGS_DISALLOW")]
    #[case("MYBUILD", Check::Cxxflags, OverrideKind::Allow, "MYBUILD_CXXFLAGS_ALLOW")]
    fn can_build_override_key(
        #[case] prefix: &str,
        #[case] check: Check,
        #[case] kind: OverrideKind,
        #[case] expected: &str,
    ) {
        assert_eq!(override_key(prefix, check, kind), expected);
    }

    #[test]
    fn absent_and_empty_values_are_unset() {
        let env = MockEnvironment::with_vars([("CGO_CFLAGS_ALLOW", "")]);
        let overrides = Overrides::resolve(DEFAULT_PREFIX, Check::Cflags, &env).unwrap();
        assert_eq!(overrides, Overrides::default());
        assert!(!overrides.is_allowed("-O2"));
        assert!(!overrides.is_disallowed("-O2"));
    }

    #[test]
    fn can_resolve_both_overrides() {
        let env = MockEnvironment::with_vars([
            ("CGO_CFLAGS_ALLOW", "-fplugin=.*"),
            ("CGO_CFLAGS_DISALLOW", "-O3"),
            ("CGO_LDFLAGS_ALLOW", "-Wl,.*"),
        ]);
        let overrides = Overrides::resolve(DEFAULT_PREFIX, Check::Cflags, &env).unwrap();
        assert!(overrides.is_allowed("-fplugin=evil.so"));
        assert!(overrides.is_disallowed("-O3"));
        assert!(!overrides.is_allowed("-Wl,-z"));
    }

    #[test]
    fn overrides_match_whole_flag() {
        let env = MockEnvironment::with_vars([("CGO_CFLAGS_DISALLOW", "-O")]);
        let overrides = Overrides::resolve(DEFAULT_PREFIX, Check::Cflags, &env).unwrap();
        assert!(overrides.is_disallowed("-O"));
        assert!(!overrides.is_disallowed("-O2"));
    }

    #[test]
    fn prefix_selects_keys() {
        let env = MockEnvironment::with_vars([("CGO_CFLAGS_ALLOW", "-x"), ("MY_CFLAGS_ALLOW", "-y")]);
        let overrides = Overrides::resolve("MY", Check::Cflags, &env).unwrap();
        assert!(overrides.is_allowed("-y"));
        assert!(!overrides.is_allowed("-x"));
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let env = MockEnvironment::with_vars([("CGO_LDFLAGS_DISALLOW", "-Wl,(")]);
        let err = Overrides::resolve(DEFAULT_PREFIX, Check::Ldflags, &env).unwrap_err();
        match &err {
            Error::Config { check, key, .. } => {
                assert_eq!(*check, Check::Ldflags);
                assert_eq!(key, "CGO_LDFLAGS_DISALLOW");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err
            .to_string()
            .starts_with("parsing $CGO_LDFLAGS_DISALLOW for LDFLAGS: "));
    }
}
