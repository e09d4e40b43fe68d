//! Property tests for the validation rules that hold for any input.

use flagfirm_core::{
    Catalog, Check, FlagValidator, MockEnvironment, RejectReason, Rule, Tool, ValidationOutcome,
};
use proptest::prelude::*;
use strum::IntoEnumIterator;

fn any_check() -> impl Strategy<Value = Check> {
    prop::sample::select(Check::iter().collect::<Vec<_>>())
}

fn samples(tool: Tool) -> Vec<String> {
    Catalog::builtin()
        .unwrap()
        .entries()
        .iter()
        .filter(|entry| entry.from == tool && matches!(entry.rule, Rule::Pattern(_)))
        .flat_map(|entry| entry.samples.clone())
        .collect()
}

fn validate(env: &MockEnvironment, check: Check, flags: &[String]) -> ValidationOutcome {
    FlagValidator::new(env)
        .unwrap()
        .validate(check, "proptest", flags)
        .unwrap()
}

proptest! {
    #[test]
    fn argument_files_are_always_rejected(check in any_check(), rest in "[ -~]{0,24}") {
        let env = MockEnvironment::default();
        let flag = format!("@{rest}");
        let outcome = validate(&env, check, &[flag]);
        prop_assert!(!outcome.is_accepted());
    }

    #[test]
    fn comma_in_paired_linker_argument_is_rejected(
        name in "[A-Za-z][A-Za-z0-9]{0,12}",
        extra in "[-A-Za-z0-9=]{0,12}",
    ) {
        let env = MockEnvironment::default();
        let flags = vec!["-Wl,-framework".to_string(), format!("-Wl,{name},{extra}")];
        let outcome = validate(&env, Check::Ldflags, &flags);
        prop_assert!(!outcome.is_accepted());

        let flags = vec!["-Wl,-framework".to_string(), format!("-Wl,{name}")];
        prop_assert!(validate(&env, Check::Ldflags, &flags).is_accepted());
    }

    #[test]
    fn disallow_beats_allow_and_catalog(sample in prop::sample::select(samples(Tool::Linker))) {
        let env = MockEnvironment::with_vars([
            ("CGO_LDFLAGS_ALLOW", ".*".to_string()),
            ("CGO_LDFLAGS_DISALLOW", regex::escape(&sample)),
        ]);
        let outcome = validate(&env, Check::Ldflags, &[sample]);
        prop_assert_eq!(outcome.rejection().map(|r| r.reason), Some(RejectReason::Disallowed));
    }

    #[test]
    fn validation_is_idempotent(
        check in any_check(),
        flags in prop::collection::vec("[-@A-Za-z0-9=,./]{0,12}", 0..6),
    ) {
        let env = MockEnvironment::default();
        let validator = FlagValidator::new(&env).unwrap();
        let first = validator.validate(check, "proptest", &flags).unwrap();
        let second = validator.validate(check, "proptest", &flags).unwrap();
        prop_assert_eq!(first, second);
    }
}
