// ABOUTME: Diagnostics accumulator for non-fatal warnings during promotion.
// ABOUTME: Collects best-effort failures that shouldn't fail a promotion but should be shown to users.

/// Collects non-fatal warnings during promotion operations.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during promotion operations.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a service URL resolution warning.
    pub fn service_url(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ServiceUrl,
            message: message.into(),
        }
    }

    /// Create a release record lookup warning.
    pub fn release_lookup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ReleaseLookup,
            message: message.into(),
        }
    }

    /// Create an issue comment warning.
    pub fn issue_comment(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::IssueComment,
            message: message.into(),
        }
    }

    /// Create a git metadata discovery warning.
    pub fn git_metadata(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::GitMetadata,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Failed to resolve the externally reachable service URL.
    ServiceUrl,
    /// Failed to look up the release record for issue commenting.
    ReleaseLookup,
    /// Failed to post a comment on a linked issue.
    IssueComment,
    /// Failed to discover git repository metadata.
    GitMetadata,
}
