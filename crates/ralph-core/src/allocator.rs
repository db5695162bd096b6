use crate::error::{RalphError, Result};

pub const STORY_ID_PREFIX: &str = "US-";

/// Hands out `US-<n>` identifiers, one per call, strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    /// Continue after the highest numeric id among `ids`. Fails when that
    /// id is already the largest representable number.
    pub fn after<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        Ok(Self::starting_at(next_story_number(max_story_number(ids))?))
    }

    /// The number the next call to [`allocate`](Self::allocate) will use.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Hand out the next id. Never wraps: once the number space is used up
    /// every call fails and no id is reused.
    pub fn allocate(&mut self) -> Result<String> {
        let id = format_story_id(self.next);
        self.next = next_story_number(self.next)?;
        Ok(id)
    }
}

/// `n + 1`, or [`RalphError::IdOverflow`] when `n` is `u64::MAX`.
pub fn next_story_number(n: u64) -> Result<u64> {
    n.checked_add(1).ok_or(RalphError::IdOverflow(n))
}

pub fn format_story_id(n: u64) -> String {
    format!("{STORY_ID_PREFIX}{n}")
}

/// Numeric value of a story id. Fractional ids (`US-12.5`) count as their
/// integer part; anything that is not a finite number yields `None`.
pub fn story_number(id: &str) -> Option<u64> {
    let suffix = id.replace(STORY_ID_PREFIX, "");
    let n: f64 = suffix.trim().parse().ok()?;
    if !n.is_finite() {
        return None;
    }
    Some(n.trunc().max(0.0) as u64)
}

/// Highest numeric id among `ids`, or 0 when none parse.
pub fn max_story_number<'a>(ids: impl IntoIterator<Item = &'a str>) -> u64 {
    let mut max = 0;
    for id in ids {
        match story_number(id) {
            Some(n) => max = max.max(n),
            None => tracing::warn!(id, "skipping story id without a numeric suffix"),
        }
    }
    max
}
