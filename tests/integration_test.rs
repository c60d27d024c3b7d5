use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Result, anyhow};
use tempfile::{TempDir, tempdir};

const HEADER: &str = "transaction_id,user_id,transaction_type,amount,transaction_date,created_at,username";

fn ledger(data_dir: &Path, args: &[&str]) -> Result<Output> {
    let binary_path = env!("CARGO_BIN_EXE_transaction-ledger");

    let output = Command::new(binary_path)
        .env_remove("LEDGER_DATA_DIR")
        .env_remove("LEDGER_LOG_LEVEL")
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .output()?;

    Ok(output)
}

fn rows(output: &Output) -> Result<Vec<Vec<String>>> {
    let stdout = String::from_utf8(output.stdout.clone())?;
    let mut lines = stdout.lines();

    match lines.next() {
        Some(header) => assert_eq!(header, HEADER),
        None => return Ok(Vec::new())
    }

    Ok(lines.map(|line| line.split(',').map(str::to_string).collect()).collect())
}

fn transaction_ids(output: &Output) -> Result<Vec<String>> {
    Ok(rows(output)?.into_iter().map(|fields| fields[0].clone()).collect())
}

/// Seeds two users and the transactions
/// 1(user 1, deposit, 2023-11-01), 2(user 1, withdrawal, 2023-11-05), 3(user 2, deposit, 2023-10-30).
fn seeded_ledger() -> Result<TempDir> {
    let directory = tempdir()?;

    fs::write(
        directory.path().join("users.csv"),
        "user_id,username,email,password_hash\n1,alice,alice@example.com,secret-hash-1\n2,bob,bob@example.com,secret-hash-2\n"
    )?;

    for args in [
        ["add", "--user-id", "1", "--type", "deposit", "--amount", "100.00", "--date", "2023-11-01"],
        ["add", "--user-id", "1", "--type", "withdrawal", "--amount", "-25.50", "--date", "2023-11-05"],
        ["add", "--user-id", "2", "--type", "deposit", "--amount", "40.00", "--date", "2023-10-30"]
    ] {
        let output = ledger(directory.path(), &args)?;

        if !output.status.success() {
            return Err(anyhow!("seeding failed: {}", String::from_utf8_lossy(&output.stderr)));
        }
    }

    Ok(directory)
}

#[test]
fn test_cli_add_prints_the_created_record() -> Result<()> {
    let directory = tempdir()?;
    fs::write(directory.path().join("users.csv"), "user_id,username,email,password_hash\n1,alice,alice@example.com,x\n")?;

    let output = ledger(directory.path(), &["add", "--user-id", "1", "--type", "deposit", "--amount", "12.34", "--date", "2023-11-01T09:30:00"])?;

    assert!(output.status.success());

    let created = rows(&output)?;

    assert_eq!(created.len(), 1);
    assert_eq!(created[0][0], "1");
    assert_eq!(created[0][1], "1");
    assert_eq!(created[0][2], "deposit");
    assert_eq!(created[0][3], "12.34");
    assert_eq!(created[0][4], "2023-11-01T09:30:00");
    assert_eq!(created[0][6], "");

    Ok(())
}

#[test]
fn test_cli_list_and_get_join_the_user() -> Result<()> {
    let directory = seeded_ledger()?;

    let listed = ledger(directory.path(), &["list"])?;

    assert!(listed.status.success());
    assert_eq!(transaction_ids(&listed)?, vec!["1", "2", "3"]);
    assert!(!String::from_utf8(listed.stdout.clone())?.contains("secret-hash"));

    let fetched = ledger(directory.path(), &["get", "2"])?;
    let fetched_rows = rows(&fetched)?;

    assert!(fetched.status.success());
    assert_eq!(fetched_rows[0][3], "-25.50");
    assert_eq!(fetched_rows[0][6], "alice");

    Ok(())
}

#[test]
fn test_cli_missing_record_exits_not_found() -> Result<()> {
    let directory = seeded_ledger()?;

    assert_eq!(ledger(directory.path(), &["get", "99"])?.status.code(), Some(3));
    assert_eq!(ledger(directory.path(), &["user", "42"])?.status.code(), Some(3));
    assert_eq!(ledger(directory.path(), &["type", "refund"])?.status.code(), Some(3));

    Ok(())
}

#[test]
fn test_cli_scenario_queries() -> Result<()> {
    let directory = seeded_ledger()?;

    let by_user = ledger(directory.path(), &["user", "1"])?;
    let by_type = ledger(directory.path(), &["type", "DEPOSIT"])?;
    let by_range = ledger(directory.path(), &["date-range", "--start", "2023-11-01", "--end", "2023-11-05"])?;

    assert_eq!(transaction_ids(&by_user)?, vec!["1", "2"]);
    assert_eq!(transaction_ids(&by_type)?, vec!["1", "3"]);
    assert_eq!(transaction_ids(&by_range)?, vec!["1", "2"]);

    Ok(())
}

#[test]
fn test_cli_filter_matches_type_exactly() -> Result<()> {
    let directory = seeded_ledger()?;

    let exact = ledger(directory.path(), &["filter", "--start", "2023-10-01", "--end", "2023-11-30", "--type", "deposit"])?;
    let other_case = ledger(directory.path(), &["filter", "--start", "2023-10-01", "--end", "2023-11-30", "--type", "DEPOSIT"])?;

    assert_eq!(transaction_ids(&exact)?, vec!["1", "3"]);
    assert_eq!(other_case.status.code(), Some(3));

    Ok(())
}

#[test]
fn test_cli_search_pages_newest_first() -> Result<()> {
    let directory = seeded_ledger()?;

    for (amount, date) in [("1", "2023-11-02"), ("2", "2023-11-03"), ("3", "2023-11-04")] {
        let output = ledger(directory.path(), &["add", "--user-id", "1", "--type", "deposit", "--amount", amount, "--date", date])?;
        assert!(output.status.success());
    }

    let search = |offset: &str| ledger(
        directory.path(),
        &["search", "--user-id", "1", "--start", "2023-11-01", "--end", "2023-11-30", "--type", "deposit", "--offset", offset, "--limit", "2"]
    );

    let first_page = search("0")?;
    let second_page = search("2")?;
    let past_the_end = search("4")?;

    assert_eq!(transaction_ids(&first_page)?, vec!["6", "5"]);
    assert_eq!(transaction_ids(&second_page)?, vec!["4", "1"]);
    assert_eq!(past_the_end.status.code(), Some(3));

    Ok(())
}

#[test]
fn test_cli_rejects_missing_or_blank_inputs() -> Result<()> {
    let directory = seeded_ledger()?;

    assert_eq!(ledger(directory.path(), &["date-range", "--start", "2023-11-01"])?.status.code(), Some(2));
    assert_eq!(ledger(directory.path(), &["filter", "--start", "2023-11-01", "--end", "2023-11-05"])?.status.code(), Some(2));
    assert_eq!(ledger(directory.path(), &["filter", "--start", "2023-11-01", "--end", "2023-11-05", "--type", "  "])?.status.code(), Some(2));
    assert_eq!(ledger(directory.path(), &["type", "   "])?.status.code(), Some(2));
    assert_eq!(ledger(directory.path(), &["date-range", "--start", "not-a-date", "--end", "2023-11-05"])?.status.code(), Some(2));

    Ok(())
}

#[test]
fn test_cli_add_for_unknown_user_is_a_fault() -> Result<()> {
    let directory = seeded_ledger()?;

    let output = ledger(directory.path(), &["add", "--user-id", "9", "--type", "deposit", "--amount", "1", "--date", "2023-11-01"])?;

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(transaction_ids(&ledger(directory.path(), &["list"])?)?.len(), 3);

    Ok(())
}
