//! Glob selection of catalog families.
//!
//! Supported syntax: `*`, `?`, `[abc]`, `[a-z]`, `[!abc]`, `{a,b,c}` and
//! `\x` escapes. Matching is case-sensitive and covers the whole name. Each
//! glob is translated into an anchored regex once, up front.

use regex::Regex;
use thiserror::Error;

use crate::catalog::FamilyDescriptor;
use crate::error::FontpeekError;

/// Why a glob failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlobError {
    #[error("unclosed character class starting at {0}")]
    UnclosedClass(usize),

    #[error("empty character class at {0}")]
    EmptyClass(usize),

    #[error("unclosed alternation starting at {0}")]
    UnclosedAlternation(usize),

    #[error("nested alternation at {0}")]
    NestedAlternation(usize),

    #[error("trailing escape character")]
    TrailingEscape,

    #[error("{0}")]
    Regex(String),
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    regex: Regex,
}

impl Glob {
    pub fn compile(pattern: &str) -> Result<Self, GlobError> {
        let source = translate(pattern)?;
        let regex = Regex::new(&source).map_err(|e| GlobError::Regex(e.to_string()))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Translate a glob into an anchored regex source string.
fn translate(pattern: &str) -> Result<String, GlobError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");
    let mut brace_start: Option<usize> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                let escaped = chars.get(i + 1).ok_or(GlobError::TrailingEscape)?;
                push_literal(&mut out, *escaped);
                i += 1;
            }
            '[' => {
                i = translate_class(&chars, i, &mut out)?;
            }
            '{' => {
                if brace_start.is_some() {
                    return Err(GlobError::NestedAlternation(i));
                }
                brace_start = Some(i);
                out.push_str("(?:");
            }
            '}' if brace_start.is_some() => {
                brace_start = None;
                out.push(')');
            }
            ',' if brace_start.is_some() => out.push('|'),
            _ => push_literal(&mut out, c),
        }
        i += 1;
    }

    if let Some(start) = brace_start {
        return Err(GlobError::UnclosedAlternation(start));
    }
    out.push('$');
    Ok(out)
}

/// Translate the class opening at `start`; returns the index of its `]`.
fn translate_class(chars: &[char], start: usize, out: &mut String) -> Result<usize, GlobError> {
    let mut i = start + 1;
    let negated = chars.get(i) == Some(&'!');
    if negated {
        i += 1;
    }

    let mut members = String::new();
    let mut count = 0;
    while i < chars.len() && chars[i] != ']' {
        let c = chars[i];
        if c == '\\' {
            let escaped = chars.get(i + 1).ok_or(GlobError::TrailingEscape)?;
            members.push_str(&regex::escape(&escaped.to_string()));
            i += 2;
        } else if c == '-' && count > 0 && chars.get(i + 1).is_some_and(|next| *next != ']') {
            members.push('-');
            i += 1;
        } else if c == '-' {
            // `-` at either edge of the class is literal.
            members.push_str("\\-");
            i += 1;
        } else {
            members.push_str(&regex::escape(&c.to_string()));
            i += 1;
        }
        count += 1;
    }

    if i >= chars.len() {
        return Err(GlobError::UnclosedClass(start));
    }
    if count == 0 {
        return Err(GlobError::EmptyClass(start));
    }
    out.push('[');
    if negated {
        out.push('^');
    }
    out.push_str(&members);
    out.push(']');
    Ok(i)
}

fn push_literal(out: &mut String, c: char) {
    out.push_str(&regex::escape(&c.to_string()));
}

/// Which families a run covers.
#[derive(Debug, Clone)]
pub enum Matcher {
    All,
    Globs(Vec<Glob>),
}

impl Matcher {
    /// Build the matcher. With `all` set the patterns are ignored entirely;
    /// otherwise the first pattern that fails to compile is reported with its
    /// position.
    pub fn new<S: AsRef<str>>(patterns: &[S], all: bool) -> Result<Self, FontpeekError> {
        if all {
            return Ok(Matcher::All);
        }
        patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| {
                Glob::compile(pattern.as_ref()).map_err(|e| FontpeekError::InvalidPattern {
                    pattern: pattern.as_ref().to_string(),
                    index,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Matcher::Globs)
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Globs(globs) => globs.iter().any(|glob| glob.is_match(name)),
        }
    }

    /// Families that match, in catalog order, each at most once.
    pub fn select<'a>(&self, families: &'a [FamilyDescriptor]) -> Vec<&'a FamilyDescriptor> {
        families
            .iter()
            .filter(|family| self.matches(&family.family))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> Vec<FamilyDescriptor> {
        names.iter().map(|n| FamilyDescriptor::named(*n)).collect()
    }

    fn names<'a>(selected: &[&'a FamilyDescriptor]) -> Vec<&'a str> {
        selected.iter().map(|f| f.family.as_str()).collect()
    }

    fn glob(pattern: &str) -> Glob {
        Glob::compile(pattern).unwrap()
    }

    #[test]
    fn test_star_prefix() {
        let families = catalog(&["Roboto", "Open Sans", "Oswald"]);
        let matcher = Matcher::new(&["O*"], false).unwrap();
        assert_eq!(names(&matcher.select(&families)), vec!["Open Sans", "Oswald"]);
    }

    #[test]
    fn test_all_selects_everything_and_ignores_patterns() {
        let families = catalog(&["Roboto", "Open Sans", "Oswald"]);
        let matcher = Matcher::new(&["[unclosed"], true).unwrap();
        assert_eq!(
            names(&matcher.select(&families)),
            vec!["Roboto", "Open Sans", "Oswald"]
        );
    }

    #[test]
    fn test_overlapping_patterns_do_not_duplicate() {
        let families = catalog(&["Roboto", "Roboto Mono", "Oswald"]);
        let matcher = Matcher::new(&["Oswald", "Roboto*", "*o"], false).unwrap();
        assert_eq!(
            names(&matcher.select(&families)),
            vec!["Roboto", "Roboto Mono", "Oswald"]
        );
    }

    #[test]
    fn test_empty_patterns_select_nothing() {
        let families = catalog(&["Roboto"]);
        let matcher = Matcher::new::<&str>(&[], false).unwrap();
        assert!(matcher.select(&families).is_empty());
    }

    #[test]
    fn test_invalid_pattern_reports_index() {
        let err = Matcher::new(&["Roboto", "Open*", "[a-"], false).unwrap_err();
        match err {
            FontpeekError::InvalidPattern { pattern, index, .. } => {
                assert_eq!(pattern, "[a-");
                assert_eq!(index, 2);
            }
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_matching_is_whole_name_and_case_sensitive() {
        assert!(glob("Rob?to").is_match("Roboto"));
        assert!(!glob("Rob").is_match("Roboto"));
        assert!(!glob("roboto").is_match("Roboto"));
    }

    #[test]
    fn test_character_classes() {
        assert!(glob("[RO]*").is_match("Oswald"));
        assert!(glob("[a-z]*").is_match("lato"));
        assert!(!glob("[a-z]*").is_match("Lato"));
        assert!(glob("[!A-M]*").is_match("Oswald"));
        assert!(!glob("[!A-M]*").is_match("Lato"));
        assert!(glob("a[-]b").is_match("a-b"));
        assert!(glob("x[ab-]").is_match("x-"));
    }

    #[test]
    fn test_alternation() {
        let g = glob("{Open,Noto} Sans");
        assert!(g.is_match("Open Sans"));
        assert!(g.is_match("Noto Sans"));
        assert!(!g.is_match("Fira Sans"));
        assert!(glob("{Fira*,Lato}").is_match("Fira Code"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(glob("M+PLUS (1p)").is_match("M+PLUS (1p)"));
        assert!(!glob("a.c").is_match("abc"));
        assert!(glob("50\\%").is_match("50%"));
        assert!(glob("\\*").is_match("*"));
        assert!(!glob("\\*").is_match("x"));
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(Glob::compile("[abc").unwrap_err(), GlobError::UnclosedClass(0));
        assert_eq!(Glob::compile("a[]").unwrap_err(), GlobError::EmptyClass(1));
        assert_eq!(
            Glob::compile("{a,b").unwrap_err(),
            GlobError::UnclosedAlternation(0)
        );
        assert_eq!(
            Glob::compile("{a,{b}}").unwrap_err(),
            GlobError::NestedAlternation(3)
        );
        assert_eq!(Glob::compile("abc\\").unwrap_err(), GlobError::TrailingEscape);
        assert!(matches!(
            Glob::compile("[z-a]").unwrap_err(),
            GlobError::Regex(_)
        ));
    }
}
