use crate::models::Transaction;
use crate::types::{Timestamp, UserId};

/// How a predicate compares the transaction type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMatch {
    /// Byte-for-byte equality, letter case included.
    Exact(String),
    /// Equality after lower-casing the stored type. The value held here must
    /// already be lower case.
    IgnoreCase(String)
}

impl TypeMatch {
    pub fn matches(&self, transaction_type: &str) -> bool {
        match self {
            TypeMatch::Exact(expected) => transaction_type == expected,
            TypeMatch::IgnoreCase(folded) => transaction_type.to_lowercase() == *folded
        }
    }
}

/// A conjunction of optional clauses. An empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub user_id: Option<UserId>,
    /// Inclusive lower bound on the transaction date.
    pub from: Option<Timestamp>,
    /// Inclusive upper bound on the transaction date.
    pub to: Option<Timestamp>,
    pub transaction_type: Option<TypeMatch>
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn between(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn of_type(mut self, transaction_type: TypeMatch) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.user_id.is_none_or(|user_id| transaction.user_id == user_id)
            && self.from.is_none_or(|from| transaction.transaction_date >= from)
            && self.to.is_none_or(|to| transaction.transaction_date <= to)
            && self.transaction_type.as_ref().is_none_or(|expected| expected.matches(&transaction.transaction_type))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    TransactionDateDescending
}

/// A predicate plus ordering, paging and the user join flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    pub predicate: Predicate,
    pub order: Option<SortOrder>,
    pub skip: Option<i32>,
    pub take: Option<i32>,
    pub with_user: bool
}

impl TransactionQuery {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn page(mut self, skip: i32, take: i32) -> Self {
        self.skip = Some(skip);
        self.take = Some(take);
        self
    }

    pub fn join_user(mut self) -> Self {
        self.with_user = true;
        self
    }

    /// Filters, orders and pages `records`, which must already be in ascending
    /// identifier order. The sort is stable, so timestamp ties keep that order.
    pub fn evaluate(&self, records: Vec<Transaction>) -> Vec<Transaction> {
        let mut selected: Vec<Transaction> = records.into_iter()
            .filter(|transaction| self.predicate.matches(transaction))
            .collect();

        if let Some(SortOrder::TransactionDateDescending) = self.order {
            selected.sort_by(|left, right| right.transaction_date.cmp(&left.transaction_date));
        }

        let skip = self.skip.map_or(0, |skip| usize::try_from(skip).unwrap_or(0));
        let take = self.take.map_or(usize::MAX, |take| usize::try_from(take).unwrap_or(0));

        selected.into_iter().skip(skip).take(take).collect()
    }
}
