use crate::types::{Timestamp, UserId};

/// Inclusive date range. An unset bound is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRangeFilter {
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>
}

impl DateRangeFilter {
    pub fn new(start_date: Timestamp, end_date: Timestamp) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date)
        }
    }

    /// Both bounds, or `None` if either one is unset.
    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        self.start_date.zip(self.end_date)
    }
}

/// Inclusive date range combined with an exact, case-sensitive type match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRangeAndTypeFilter {
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub transaction_type: String
}

impl DateRangeAndTypeFilter {
    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        self.start_date.zip(self.end_date)
    }
}

/// The full paged filter.
///
/// `offset` and `limit` are handed to the store untouched, so the meaning of
/// negative or zero values is whatever the store defines.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    pub user_id: UserId,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    /// Matched exactly, including letter case.
    pub transaction_type: String,
    /// Rows to skip after ordering.
    pub offset: i32,
    /// Maximum rows to return.
    pub limit: i32
}
