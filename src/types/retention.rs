use std::fmt;

/// How many rows survived a filtering or joining step.
///
/// Purely informational: a low retention is expected on sparse data and is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Retention {
    pub kept: usize,
    pub total: usize,
}

impl Retention {
    pub fn new(kept: usize, total: usize) -> Self {
        Self { kept, total }
    }

    /// `kept / total`, or `None` when there was nothing to keep.
    pub fn ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| self.kept as f64 / self.total as f64)
    }

    pub fn dropped(&self) -> usize {
        self.total.saturating_sub(self.kept)
    }
}

/// Formats as `kept/total (ratio%)`.
///
/// # Examples
///
/// ```
/// use raindust::Retention;
///
/// assert_eq!(Retention::new(3, 4).to_string(), "3/4 (75.00%)");
/// assert_eq!(Retention::new(0, 0).to_string(), "0/0 (n/a)");
/// ```
impl fmt::Display for Retention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ratio() {
            Some(ratio) => write!(f, "{}/{} ({:.2}%)", self.kept, self.total, ratio * 100.0),
            None => write!(f, "{}/{} (n/a)", self.kept, self.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_is_exact_fraction() {
        let retention = Retention::new(2, 3);
        assert_eq!(retention.ratio(), Some(2.0 / 3.0));
        assert_eq!(retention.dropped(), 1);
    }

    #[test]
    fn test_empty_has_no_ratio() {
        assert_eq!(Retention::default().ratio(), None);
    }
}
