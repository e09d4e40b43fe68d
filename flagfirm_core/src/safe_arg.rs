//! Decide whether a bare argument may follow a flag positionally.

/// Judges whether a token is safe to pass as a positional argument.
///
/// Any `Fn(&str) -> bool` closure implements it, so callers can plug in the
/// predicate their build driver already uses.
pub trait SafeArg: Send + Sync {
    fn is_safe(&self, arg: &str) -> bool;
}

impl<F> SafeArg for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_safe(&self, arg: &str) -> bool {
        self(arg)
    }
}

/// Default predicate: rejects empty tokens and tokens the toolchain would
/// read as a new flag (`-`) or as an argument file (`@`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalArg;

impl SafeArg for PositionalArg {
    fn is_safe(&self, arg: &str) -> bool {
        !arg.is_empty() && !arg.starts_with(['-', '@'])
    }
}
