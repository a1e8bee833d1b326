//! Regex-constrained string patterns.
//!
//! A [`FieldRegex`] keeps the pattern exactly as it was written (so it can be
//! rendered back as `/source/flags`) next to a compiled form anchored at both
//! ends, which gives every pattern full-match semantics.
//!
//! A [`NamedPattern`] is a reusable constrained-string type kept in a
//! [`PatternLibrary`]; fields refer to it by name instead of repeating the
//! regex inline.

use indexmap::IndexMap;
use regex::Regex;
use std::fmt;

/// Flags accepted after the closing slash of a regex literal.
pub const SUPPORTED_FLAGS: &[char] = &['i', 'm', 's', 'u'];

/// Error building a [`FieldRegex`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("unsupported regex flag '{0}'")]
    UnsupportedFlag(char),

    #[error("duplicate regex flag '{0}'")]
    DuplicateFlag(char),

    #[error("invalid regex: {0}")]
    Invalid(String),
}

/// A compiled string pattern with full-match semantics.
#[derive(Debug, Clone)]
pub struct FieldRegex {
    source: String,
    flags: String,
    anchored: Regex,
}

impl FieldRegex {
    /// Compile a pattern without flags.
    pub fn new(source: impl Into<String>) -> Result<Self, PatternError> {
        Self::with_flags(source, "")
    }

    /// Compile a pattern with literal flags (`i`, `m`, `s`, `u`).
    pub fn with_flags(source: impl Into<String>, flags: &str) -> Result<Self, PatternError> {
        let source = source.into();
        let mut inline = String::new();
        let mut seen = Vec::new();

        for flag in flags.chars() {
            if !SUPPORTED_FLAGS.contains(&flag) {
                return Err(PatternError::UnsupportedFlag(flag));
            }
            if seen.contains(&flag) {
                return Err(PatternError::DuplicateFlag(flag));
            }
            seen.push(flag);
            // `u` is the default for this regex engine
            if flag != 'u' {
                inline.push(flag);
            }
        }

        // Checked on its own so an unbalanced `)` cannot close the anchoring group
        Regex::new(&source).map_err(|e| PatternError::Invalid(e.to_string()))?;

        let prefix = if inline.is_empty() {
            String::new()
        } else {
            format!("(?{inline})")
        };
        let anchored = Regex::new(&format!(r"{prefix}\A(?:{source})\z"))
            .map_err(|e| PatternError::Invalid(e.to_string()))?;

        Ok(Self {
            source,
            flags: flags.to_string(),
            anchored,
        })
    }

    /// The pattern as written, without slashes.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The literal flags, in the order they were written.
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// True when the whole of `value` matches the pattern.
    pub fn is_full_match(&self, value: &str) -> bool {
        self.anchored.is_match(value)
    }
}

impl PartialEq for FieldRegex {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Eq for FieldRegex {}

impl fmt::Display for FieldRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// A shared, named constrained-string type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPattern {
    /// The name fields refer to
    pub name: String,
    /// The pattern values must fully match
    pub regex: FieldRegex,
}

impl NamedPattern {
    /// Create a named pattern from an already compiled regex.
    pub fn new(name: impl Into<String>, regex: FieldRegex) -> Self {
        Self {
            name: name.into(),
            regex,
        }
    }

    /// Compile `source` and name it.
    pub fn compile(name: impl Into<String>, source: &str) -> Result<Self, PatternError> {
        Ok(Self::new(name, FieldRegex::new(source)?))
    }
}

/// A library of named patterns, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: IndexMap<String, NamedPattern>,
}

impl PatternLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern, returning the one it replaced.
    pub fn insert(&mut self, pattern: NamedPattern) -> Option<NamedPattern> {
        self.patterns.insert(pattern.name.clone(), pattern)
    }

    /// Look a pattern up by name.
    pub fn get(&self, name: &str) -> Option<&NamedPattern> {
        self.patterns.get(name)
    }

    /// Iterate patterns in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedPattern> {
        self.patterns.values()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
