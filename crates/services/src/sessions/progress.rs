/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// New plus due items planned for the session.
    pub total: usize,
    /// Items learned or reviewed against the current plan.
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn new(total: usize, answered: usize, is_complete: bool) -> Self {
        Self {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete,
        }
    }
}
