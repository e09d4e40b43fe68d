//! Catalog of recognized-safe compiler and linker flag shapes
//!
//! Entries are kept as YAML under the `flags` folder and embedded at build
//! time (see `build.rs`). Every pattern is compiled by [`FlagPattern`], which
//! anchors it to the whole flag: a pattern that only matches a prefix of a
//! flag never accepts it.

use std::{collections::HashSet, fmt, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

/// String with all entries from the `flags` folder (prepared in build.rs) in
/// YAML format.
const ALL_FLAGS: &str = include_str!(concat!(env!("OUT_DIR"), "/all-flags.yaml"));

/// Flags whose value is split at commas and handed to another tool verbatim.
pub const GROUPED_PREFIXES: [&str; 3] = ["-Wl,", "-Wa,", "-Wp,"];

/// Which half of the catalog applies to a flag list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tool {
    Compiler,
    Linker,
}

impl Tool {
    /// Convert a tool name to enum
    ///
    /// # Errors
    /// when the given name is not a known tool
    pub fn parse(name: &str) -> Result<Self> {
        name.parse().map_err(|_| Error::UnknownTool {
            name: name.to_string(),
        })
    }
}

/// A named flag list, as found in package directives and in the environment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Check {
    Cflags,
    Cppflags,
    Cxxflags,
    Fflags,
    Ldflags,
}

impl Check {
    /// The catalog half used to validate this flag list.
    #[must_use]
    pub const fn tool(self) -> Tool {
        match self {
            Self::Ldflags => Tool::Linker,
            Self::Cflags | Self::Cppflags | Self::Cxxflags | Self::Fflags => Tool::Compiler,
        }
    }

    /// Convert a check name (`CFLAGS`, `ldflags`, ...) to enum
    ///
    /// # Errors
    /// when the given name is not a known check
    pub fn parse(name: &str) -> Result<Self> {
        name.parse().map_err(|_| Error::UnknownCheck {
            name: name.to_string(),
        })
    }
}

/// A pattern that only ever matches a flag in its entirety.
#[derive(Clone, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlagPattern {
    source: String,
    regex: Regex,
}

impl FlagPattern {
    /// Compile `source` anchored at both ends.
    ///
    /// # Errors
    /// when `source` is not a valid regular expression
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        // Compiled alone first so unbalanced groups cannot close the anchoring
        // group below.
        Regex::new(source)?;
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern text as written, without anchors.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True only when the pattern covers every byte of `flag`.
    #[must_use]
    pub fn is_full_match(&self, flag: &str) -> bool {
        self.regex
            .find(flag)
            .is_some_and(|m| m.start() == 0 && m.end() == flag.len())
    }
}

impl TryFrom<String> for FlagPattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(&source)
    }
}

impl From<FlagPattern> for String {
    fn from(pattern: FlagPattern) -> Self {
        pattern.source
    }
}

impl PartialEq for FlagPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for FlagPattern {}

impl fmt::Debug for FlagPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FlagPattern").field(&self.source).finish()
    }
}

impl fmt::Display for FlagPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// How an entry recognizes a flag.
///
/// YAML format (adjacently tagged):
/// ```yaml
/// rule:
///   type: Pattern
///   value: '-O([^@\-].*)'
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Rule {
    /// The flag is accepted when the pattern matches all of it.
    Pattern(FlagPattern),
    /// The flag is exactly this name and takes the following argument.
    TakesArg(String),
}

/// Describe a single catalog entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogEntry {
    /// Unique identifier, `<tool>:<name>`
    pub id: String,
    /// The catalog half this entry belongs to
    pub from: Tool,
    /// What the flag does
    pub description: String,
    pub rule: Rule,
    /// Flags the entry is expected to accept. Used by [`validate_catalog`].
    #[serde(default)]
    pub samples: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct ToolTable {
    /// Indexes into [`Catalog::entries`] of pattern entries, in file order.
    patterns: Vec<usize>,
    takes_arg: HashSet<String>,
}

/// The compiler and linker halves of the flag catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    compiler: ToolTable,
    linker: ToolTable,
}

impl Catalog {
    /// Return a cached reference to the built-in catalog.
    ///
    /// The YAML is parsed and patterns are compiled once per process.
    ///
    /// # Errors
    /// when the embedded YAML cannot be parsed into [`CatalogEntry`] list
    pub fn builtin() -> Result<&'static Self> {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        if let Some(catalog) = CATALOG.get() {
            return Ok(catalog);
        }
        let catalog = Self::from_yaml(ALL_FLAGS)?;
        Ok(CATALOG.get_or_init(|| catalog))
    }

    /// Parse a catalog from a YAML list of entries.
    ///
    /// # Errors
    /// when the YAML is malformed or a pattern does not compile
    pub fn from_yaml(content: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_yaml::from_str(content)?;
        Ok(Self::from_entries(entries))
    }

    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut compiler = ToolTable::default();
        let mut linker = ToolTable::default();

        for (index, entry) in entries.iter().enumerate() {
            let table = match entry.from {
                Tool::Compiler => &mut compiler,
                Tool::Linker => &mut linker,
            };
            match &entry.rule {
                Rule::Pattern(_) => table.patterns.push(index),
                Rule::TakesArg(name) => {
                    table.takes_arg.insert(name.clone());
                }
            }
        }

        Self {
            entries,
            compiler,
            linker,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    const fn table(&self, tool: Tool) -> &ToolTable {
        match tool {
            Tool::Compiler => &self.compiler,
            Tool::Linker => &self.linker,
        }
    }

    /// Pattern entries of one tool, in catalog order.
    pub fn pattern_entries(&self, tool: Tool) -> impl Iterator<Item = (&CatalogEntry, &FlagPattern)> + '_ {
        self.table(tool).patterns.iter().filter_map(|&index| {
            let entry = &self.entries[index];
            match &entry.rule {
                Rule::Pattern(pattern) => Some((entry, pattern)),
                Rule::TakesArg(_) => None,
            }
        })
    }

    /// The first pattern entry of `tool` that matches the whole `flag`.
    #[must_use]
    pub fn matching_entry(&self, tool: Tool, flag: &str) -> Option<&CatalogEntry> {
        self.pattern_entries(tool)
            .find(|(_, pattern)| pattern.is_full_match(flag))
            .map(|(entry, _)| entry)
    }

    /// Whether `flag` is exactly one of the names that take the next
    /// argument for `tool`.
    #[must_use]
    pub fn takes_arg(&self, tool: Tool, flag: &str) -> bool {
        self.table(tool).takes_arg.contains(flag)
    }
}

/// Validate catalog entries and return a list of warning messages.
///
/// Currently checks:
/// - duplicate entry ids
/// - a sample that its own pattern does not accept
/// - a sample that is still accepted with `@` in front of it
/// - a grouped sample (`-Wl,...`) that is still accepted with another
///   comma-separated flag appended
#[must_use]
pub fn validate_catalog(catalog: &Catalog) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for entry in catalog.entries() {
        if !seen.insert(entry.id.as_str()) {
            warnings.push(format!("entry {:?}: duplicate id", entry.id));
        }

        let Rule::Pattern(pattern) = &entry.rule else {
            continue;
        };

        for sample in &entry.samples {
            if !pattern.is_full_match(sample) {
                warnings.push(format!(
                    "entry {:?}: sample {sample:?} is not accepted by {pattern}",
                    entry.id
                ));
            }

            let response_file = format!("@{sample}");
            if pattern.is_full_match(&response_file) {
                warnings.push(format!(
                    "entry {:?}: {pattern} accepts argument-file reference {response_file:?}",
                    entry.id
                ));
            }

            if GROUPED_PREFIXES.iter().any(|prefix| sample.starts_with(prefix)) {
                let tunnelled = format!("{sample},--tunnelled");
                if pattern.is_full_match(&tunnelled) {
                    warnings.push(format!(
                        "entry {:?}: {pattern} lets extra flags through commas, e.g. {tunnelled:?}",
                        entry.id
                    ));
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    const TEST_FLAGS: &str = r#"
- id: compiler:optimize
  from: compiler
  description: "Optimization level"
  rule:
    type: Pattern
    value: '-O([^@\-].*)'
  samples: ['-O2']
- id: compiler:include_next
  from: compiler
  description: "Include dir as next argument"
  rule:
    type: TakesArg
    value: '-I'
- id: linker:library
  from: linker
  description: "Library"
  rule:
    type: Pattern
    value: '-l([^@\-].*)'
  samples: ['-lm']
"#;

    #[rstest]
    #[case("CFLAGS", Check::Cflags, Tool::Compiler)]
    #[case("cppflags", Check::Cppflags, Tool::Compiler)]
    #[case("CXXFLAGS", Check::Cxxflags, Tool::Compiler)]
    #[case("FFlags", Check::Fflags, Tool::Compiler)]
    #[case("LDFLAGS", Check::Ldflags, Tool::Linker)]
    fn can_parse_check(#[case] name: &str, #[case] check: Check, #[case] tool: Tool) {
        let parsed = Check::parse(name).expect("known check");
        assert_eq!(parsed, check);
        assert_eq!(parsed.tool(), tool);
    }

    #[test]
    fn check_display_round_trips() {
        for check in Check::iter() {
            assert_eq!(Check::parse(&check.to_string()).unwrap(), check);
        }
        assert_eq!(Check::Cppflags.to_string(), "CPPFLAGS");
        assert_eq!(Tool::Linker.to_string(), "linker");
    }

    #[test]
    fn unknown_names_are_errors() {
        assert!(matches!(
            Check::parse("ASFLAGS"),
            Err(Error::UnknownCheck { name }) if name == "ASFLAGS"
        ));
        assert!(matches!(Tool::parse("assembler"), Err(Error::UnknownTool { .. })));
    }

    #[rstest]
    #[case("-O([^@\\-].*)", "-O2", true)]
    #[case("-O([^@\\-].*)", "-O-fplugin=x.so", false)]
    #[case("-pipe", "-pipe", true)]
    #[case("-pipe", "-pipe=evil", false)]
    #[case("-pipe", "x-pipe", false)]
    #[case("-O|-Os", "-Os", true)]
    #[case("-W([^@,]+)", "-Wl,-plugin", false)]
    fn pattern_matches_whole_flag(#[case] source: &str, #[case] flag: &str, #[case] expected: bool) {
        let pattern = FlagPattern::new(source).expect("valid pattern");
        assert_eq!(pattern.is_full_match(flag), expected);
    }

    #[test]
    fn pattern_cannot_escape_anchoring() {
        // Balanced on its own only when joined with the anchoring group.
        assert!(FlagPattern::new("a)|(b").is_err());
        assert!(FlagPattern::new("(").is_err());
    }

    #[test]
    fn pattern_keeps_its_source() {
        let pattern = FlagPattern::new("-g([^@\\-].*)?").unwrap();
        assert_eq!(pattern.as_str(), "-g([^@\\-].*)?");
        assert_eq!(pattern.to_string(), "-g([^@\\-].*)?");
        assert_eq!(String::from(pattern), "-g([^@\\-].*)?");
    }

    #[test]
    fn can_build_catalog_from_yaml() {
        let catalog = Catalog::from_yaml(TEST_FLAGS).expect("valid test yaml");
        assert_eq!(catalog.entries().len(), 3);

        assert!(catalog.matching_entry(Tool::Compiler, "-O2").is_some());
        assert!(!catalog.matching_entry(Tool::Linker, "-O2").is_some());
        assert!(catalog.matching_entry(Tool::Linker, "-lm").is_some());
        assert!(!catalog.matching_entry(Tool::Compiler, "-lm").is_some());

        assert!(catalog.takes_arg(Tool::Compiler, "-I"));
        assert!(!catalog.takes_arg(Tool::Linker, "-I"));
        assert!(!catalog.takes_arg(Tool::Compiler, "-I/usr/include"));

        let entry = catalog.matching_entry(Tool::Compiler, "-Os").unwrap();
        assert_eq!(entry.id, "compiler:optimize");
    }

    #[test]
    fn invalid_pattern_fails_catalog_load() {
        let yaml = r#"
- id: compiler:broken
  from: compiler
  description: broken
  rule:
    type: Pattern
    value: '-O(['
"#;
        assert!(matches!(Catalog::from_yaml(yaml), Err(Error::CatalogLoad { .. })));
    }

    #[test]
    fn can_get_builtin_catalog() {
        let catalog = Catalog::builtin().expect("built-in catalog is valid YAML");
        assert!(catalog.pattern_entries(Tool::Compiler).count() > 30);
        assert!(catalog.pattern_entries(Tool::Linker).count() > 20);
        assert!(catalog.takes_arg(Tool::Linker, "-Wl,-framework"));
        assert!(!catalog.takes_arg(Tool::Compiler, "-Wl,-framework"));
        assert!(catalog.takes_arg(Tool::Compiler, "-isystem"));
    }

    #[test]
    fn builtin_catalog_passes_validation() {
        let catalog = Catalog::builtin().unwrap();
        let warnings = validate_catalog(catalog);
        assert!(
            warnings.is_empty(),
            "Built-in catalog has validation warnings:\n{}",
            warnings.join("\n")
        );
    }

    #[test]
    fn every_builtin_pattern_has_samples() {
        let catalog = Catalog::builtin().unwrap();
        let missing: Vec<&str> = catalog
            .entries()
            .iter()
            .filter(|entry| matches!(entry.rule, Rule::Pattern(_)) && entry.samples.is_empty())
            .map(|entry| entry.id.as_str())
            .collect();
        assert!(missing.is_empty(), "entries without samples: {missing:?}");
    }

    #[test]
    fn validate_catches_comma_wildcard() {
        let yaml = r#"
- id: linker:loose_rpath
  from: linker
  description: too loose
  rule:
    type: Pattern
    value: '-Wl,-rpath,.*'
  samples: ['-Wl,-rpath,/opt/lib']
- id: linker:loose_rpath
  from: linker
  description: duplicate
  rule:
    type: Pattern
    value: '-Wl,-rpath,[^,]+'
  samples: ['-Wl,-rpath=/opt/lib']
- id: linker:loose_input
  from: linker
  description: any object file
  rule:
    type: Pattern
    value: '.*\.o'
  samples: ['foo.o']
"#;
        let catalog = Catalog::from_yaml(yaml).unwrap();
        let warnings = validate_catalog(&catalog);
        assert_eq!(warnings.len(), 4, "{warnings:#?}");
        assert!(warnings[0].contains("-Wl,-rpath,/opt/lib,--tunnelled"));
        assert!(warnings[1].contains("duplicate id"));
        assert!(warnings[2].contains("is not accepted"));
        assert!(warnings[3].contains("argument-file"));
    }
}
