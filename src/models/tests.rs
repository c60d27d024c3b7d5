use super::{DateRangeAndTypeFilter, DateRangeFilter, NewTransaction, Transaction, User};

use std::str::FromStr;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

fn timestamp(year: i32, month: u32, day: u32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("invalid date {year}-{month}-{day}"))
}

fn create_user(user_id: u32) -> User {
    User {
        user_id,
        username: format!("user{user_id}"),
        email: format!("user{user_id}@example.com"),
        password_hash: "not-a-real-hash".to_string()
    }
}

#[test]
fn test_create_keeps_submitted_fields_and_assigns_identity() -> Result<()> {
    let new = NewTransaction {
        user_id: 7,
        transaction_type: "Withdrawal".to_string(),
        amount: Decimal::from_str("-12.50")?,
        transaction_date: timestamp(2023, 11, 5)?
    };
    let created_at = timestamp(2024, 1, 1)?;

    let transaction = Transaction::create(42, new.clone(), created_at);

    assert_eq!(transaction.transaction_id, 42);
    assert_eq!(transaction.user_id, new.user_id);
    assert_eq!(transaction.transaction_type, "Withdrawal");
    assert_eq!(transaction.amount, Decimal::from_str("-12.50")?);
    assert_eq!(transaction.transaction_date, new.transaction_date);
    assert_eq!(transaction.created_at, created_at);
    assert!(transaction.user.is_none());

    Ok(())
}

#[test]
fn test_with_user_attaches_the_owner() -> Result<()> {
    let new = NewTransaction {
        user_id: 1,
        transaction_type: "deposit".to_string(),
        amount: Decimal::from_str("10.00")?,
        transaction_date: timestamp(2023, 11, 1)?
    };

    let transaction = Transaction::create(1, new, timestamp(2023, 11, 1)?).with_user(Some(create_user(1)));

    assert_eq!(transaction.user.map(|user| user.username), Some("user1".to_string()));

    Ok(())
}

#[test]
fn test_date_range_bounds_require_both_dates() -> Result<()> {
    let start = timestamp(2023, 11, 1)?;
    let end = timestamp(2023, 11, 5)?;

    assert_eq!(DateRangeFilter::new(start, end).bounds(), Some((start, end)));
    assert_eq!(DateRangeFilter { start_date: Some(start), end_date: None }.bounds(), None);
    assert_eq!(DateRangeFilter { start_date: None, end_date: Some(end) }.bounds(), None);
    assert_eq!(DateRangeFilter::default().bounds(), None);

    let filter = DateRangeAndTypeFilter {
        start_date: None,
        end_date: Some(end),
        transaction_type: "deposit".to_string()
    };

    assert_eq!(filter.bounds(), None);

    Ok(())
}

#[test]
fn test_user_serialization_omits_password_hash() -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.serialize(create_user(3))?;
    writer.flush()?;
    let output = String::from_utf8(writer.get_ref().clone())?;

    assert!(output.starts_with("user_id,username,email\n"));
    assert!(output.contains("3,user3,user3@example.com"));
    assert!(!output.contains("not-a-real-hash"));

    Ok(())
}
