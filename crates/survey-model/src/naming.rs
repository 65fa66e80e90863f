//! Sequential name generation.
//!
//! Encoders, labels, and scorings may be built without an explicit name. The
//! builders then draw one from a [`NameSequence`] owned by the caller, so two
//! independent survey definitions never share a counter.

/// Produces `"<prefix>-0"`, `"<prefix>-1"`, ... on demand.
///
/// # Examples
///
/// ```
/// use survey_model::NameSequence;
///
/// let mut names = NameSequence::new("encoder");
/// assert_eq!(names.next_name(), "encoder-0");
/// assert_eq!(names.next_name(), "encoder-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSequence {
    prefix: String,
    next: usize,
}

impl NameSequence {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    /// Sequence for encoder names.
    pub fn encoders() -> Self {
        Self::new("encoder")
    }

    /// Sequence for label names.
    pub fn labels() -> Self {
        Self::new("label")
    }

    /// Sequence for scoring names.
    pub fn scorings() -> Self {
        Self::new("scoring")
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the next name and advances the counter.
    pub fn next_name(&mut self) -> String {
        let name = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        name
    }
}

impl Iterator for NameSequence {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_name())
    }
}
