mod filters;
#[cfg(test)]
mod tests;
mod transaction;
mod user;

pub use filters::{DateRangeAndTypeFilter, DateRangeFilter, TransactionFilter};
pub use transaction::{NewTransaction, Transaction};
pub use user::User;
