//! Diagnostic breadcrumbs recorded while a configuration is parsed
//!
//! An [`ErrorContext`] belongs to exactly one build call. The parser writes
//! into it as it works through a document, the builder renders it into the
//! error when the call fails and resets it before returning.

use std::fmt;

/// Accumulates "where did this fail" information for one build call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    resource: Option<String>,
    activity: Option<String>,
    object: Option<String>,
    notes: Vec<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the resource being read
    pub fn resource(&mut self, resource: impl Into<String>) -> &mut Self {
        self.resource = Some(resource.into());
        self
    }

    /// Record the current activity
    pub fn activity(&mut self, activity: impl Into<String>) -> &mut Self {
        self.activity = Some(activity.into());
        self
    }

    /// Record the object being worked on
    pub fn object(&mut self, object: impl Into<String>) -> &mut Self {
        self.object = Some(object.into());
        self
    }

    /// Append a free-form note
    pub fn note(&mut self, note: impl Into<String>) -> &mut Self {
        self.notes.push(note.into());
        self
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.resource.is_none()
            && self.activity.is_none()
            && self.object.is_none()
            && self.notes.is_empty()
    }

    /// Clear everything recorded so far. Safe to call on an empty context.
    pub fn reset(&mut self) {
        self.resource = None;
        self.activity = None;
        self.object = None;
        self.notes.clear();
    }

    /// Rendered breadcrumbs, or `None` when nothing was recorded
    pub fn snapshot(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();

        if let Some(resource) = &self.resource {
            lines.push(format!("### The error may exist in {resource}"));
        }
        if let Some(object) = &self.object {
            lines.push(format!("### The error may involve {object}"));
        }
        if let Some(activity) = &self.activity {
            lines.push(format!("### The error occurred while {activity}"));
        }
        for note in &self.notes {
            lines.push(format!("### {note}"));
        }

        f.write_str(&lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_is_idempotent() {
        let mut ctx = ErrorContext::new();
        ctx.reset();
        assert!(ctx.is_empty());

        ctx.resource("config.yaml").activity("parsing configuration").note("line 3");
        assert!(!ctx.is_empty());

        ctx.reset();
        assert!(ctx.is_empty());
        ctx.reset();
        assert_eq!(ctx, ErrorContext::default());
    }

    #[test]
    fn test_snapshot_rendering() {
        let mut ctx = ErrorContext::new();
        assert!(ctx.snapshot().is_none());

        ctx.resource("config.yaml")
            .object("environment dev")
            .activity("selecting environment");

        let rendered = ctx.snapshot().unwrap();
        assert_eq!(
            rendered,
            "### The error may exist in config.yaml\n\
             ### The error may involve environment dev\n\
             ### The error occurred while selecting environment"
        );
    }

    #[test]
    fn test_notes_accumulate() {
        let mut ctx = ErrorContext::new();
        ctx.note("first").note("second");
        assert_eq!(ctx.notes(), ["first".to_string(), "second".to_string()]);
    }
}
