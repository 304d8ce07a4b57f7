//! Diagnostic parsers
//!
//! Extract the offending field name from a rejected write's diagnostic
//! text. The retry loop only ever asks one question of the text, so each
//! store dialect can bring its own parser.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Finds the field a bad-payload diagnostic complains about
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticParser: Send + Sync {
    /// Name of the single offending property, if the text identifies one
    fn parse_invalid_property(&self, text: &str) -> Option<String>;
}

impl<P: DiagnosticParser + ?Sized> DiagnosticParser for Arc<P> {
    fn parse_invalid_property(&self, text: &str) -> Option<String> {
        (**self).parse_invalid_property(text)
    }
}

impl<P: DiagnosticParser + ?Sized> DiagnosticParser for Box<P> {
    fn parse_invalid_property(&self, text: &str) -> Option<String> {
        (**self).parse_invalid_property(text)
    }
}

static INVALID_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)invalid property\s+['"]([^'"]+)['"]"#)
        .expect("valid invalid-property pattern")
});

static UNDECLARED_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)property named\s+['"]([^'"]+)['"].*?does not exist"#)
        .expect("valid undeclared-property pattern")
});

/// Parser for OData-style property diagnostics
///
/// Recognises `Invalid property 'x' was found ...` and
/// `... property named 'x' ... does not exist ...`, with single or double
/// quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidPropertyParser;

impl DiagnosticParser for InvalidPropertyParser {
    fn parse_invalid_property(&self, text: &str) -> Option<String> {
        [&*INVALID_PROPERTY, &*UNDECLARED_PROPERTY]
            .iter()
            .find_map(|pattern| pattern.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    }
}
