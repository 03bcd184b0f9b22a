// ABOUTME: Record-safe resource name sanitization.
// ABOUTME: Collapses arbitrary pipeline identifiers into RFC 1123 style names.

use std::fmt;

/// A name that is safe to use as a durable record identifier.
///
/// Derived identifiers (pipeline paths, build numbers, chart names with
/// versions) may contain slashes, uppercase letters or other characters that
/// are not valid in resource names. `ResourceName` lowercases the input and
/// collapses every disallowed character into a hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName(String);

impl ResourceName {
    /// Sanitize into a lowercase alphanumeric-and-hyphen name.
    pub fn sanitize(value: &str) -> Self {
        Self(sanitize_with(value, false))
    }

    /// Like [`ResourceName::sanitize`] but keeps dots, for names that embed
    /// a version such as `myapp-1.2.3`.
    pub fn sanitize_with_dots(value: &str) -> Self {
        Self(sanitize_with(value, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn sanitize_with(value: &str, keep_dots: bool) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_was_hyphen = false;
    for c in value.chars() {
        let mapped = match c {
            'a'..='z' | '0'..='9' => Some(c),
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            '.' if keep_dots => Some('.'),
            _ => None,
        };
        match mapped {
            Some(c) => {
                out.push(c);
                last_was_hyphen = false;
            }
            None => {
                // Collapse runs of invalid characters into a single hyphen.
                if !out.is_empty() && !last_was_hyphen {
                    out.push('-');
                    last_was_hyphen = true;
                }
            }
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
