//! Page objects against a scripted session

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{FakeSession, FakeState, SharedState};
use xyzbank_e2e::pages::{customer, login, manager, Pages, Transaction, TransactionKind};
use xyzbank_e2e::E2eError;

const WAIT: Duration = Duration::from_millis(300);

fn state() -> SharedState {
    Arc::new(parking_lot::Mutex::new(FakeState::default()))
}

fn column(rows: &str, n: usize) -> String {
    format!("{} td:nth-child({})", rows, n)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_transactions_table() {
    let state = state();
    {
        let mut s = state.lock();
        let rows = customer::TRANSACTION_ROWS;
        s.lists.insert(rows.to_string(), strings(&["row", "row"]));
        s.lists.insert(
            column(rows, 1),
            strings(&["Oct 16, 2026 10:00:01 AM", "Oct 16, 2026 10:00:05 AM"]),
        );
        s.lists.insert(column(rows, 2), strings(&["100", "40"]));
        s.lists.insert(column(rows, 3), strings(&["Credit", "Debit"]));
    }
    let session = FakeSession::new(state);
    let pages = Pages::new(&session, WAIT);

    assert_eq!(pages.customer.wait_for_transactions(2).await.unwrap(), 2);
    let transactions = pages.customer.transactions().await.unwrap();
    assert_eq!(
        transactions,
        vec![
            Transaction {
                date_time: "Oct 16, 2026 10:00:01 AM".to_string(),
                amount: 100,
                kind: TransactionKind::Credit,
            },
            Transaction {
                date_time: "Oct 16, 2026 10:00:05 AM".to_string(),
                amount: 40,
                kind: TransactionKind::Debit,
            },
        ]
    );
}

#[tokio::test]
async fn test_ragged_customer_table_is_rejected() {
    let state = state();
    {
        let mut s = state.lock();
        let rows = manager::CUSTOMER_ROWS;
        s.lists.insert(column(rows, 1), strings(&["Hermoine", "Harry"]));
        s.lists.insert(column(rows, 2), strings(&["Granger", "Potter"]));
        s.lists.insert(column(rows, 3), strings(&["E859AB"]));
        s.lists.insert(column(rows, 4), strings(&["1001 1002", "1004"]));
    }
    let session = FakeSession::new(state);
    let pages = Pages::new(&session, WAIT);

    let err = pages.manager.customer_rows().await.unwrap_err();
    assert!(matches!(err, E2eError::UnexpectedContent(_)));
}

#[tokio::test]
async fn test_customer_rows_split_accounts() {
    let state = state();
    {
        let mut s = state.lock();
        let rows = manager::CUSTOMER_ROWS;
        s.lists.insert(column(rows, 1), strings(&["Hermoine"]));
        s.lists.insert(column(rows, 2), strings(&["Granger"]));
        s.lists.insert(column(rows, 3), strings(&["E859AB"]));
        s.lists.insert(column(rows, 4), strings(&["1001 1002 1003"]));
    }
    let session = FakeSession::new(state.clone());
    let pages = Pages::new(&session, WAIT);

    let rows = pages.manager.customer_rows().await.unwrap();
    assert_eq!(rows[0].full_name(), "Hermoine Granger");
    assert_eq!(rows[0].account_numbers, strings(&["1001", "1002", "1003"]));

    pages.manager.delete_customer("Hermoine").await.unwrap();
    assert!(state.lock().calls.contains(&format!(
        "click:{}:nth-child(1) button[ng-click='deleteCust(cust)']",
        manager::CUSTOMER_ROWS
    )));
}

#[tokio::test]
async fn test_delete_missing_customer() {
    let session = FakeSession::new(state());
    let pages = Pages::new(&session, WAIT);

    let err = pages.manager.delete_customer("Nobody").await.unwrap_err();
    assert!(matches!(err, E2eError::ElementNotFound(_)));
}

#[tokio::test]
async fn test_hidden_element_wait_is_bounded() {
    let state = state();
    state.lock().hidden.insert(customer::LOGOUT.to_string());
    let session = FakeSession::new(state.clone());
    let pages = Pages::new(&session, WAIT);

    let start = Instant::now();
    let err = pages.customer.logout().await.unwrap_err();

    assert!(matches!(err, E2eError::Timeout(_)));
    assert!(start.elapsed() >= WAIT);
    assert!(state.lock().position(&format!("click:{}", customer::LOGOUT)).is_none());
}

#[tokio::test]
async fn test_withdraw_waits_for_withdraw_form() {
    let state = state();
    state
        .lock()
        .texts
        .insert(customer::FORM_SUBMIT.to_string(), "Deposit".to_string());
    let session = FakeSession::new(state);
    let pages = Pages::new(&session, WAIT);

    let err = pages.customer.withdraw("50").await.unwrap_err();
    assert!(matches!(err, E2eError::Timeout(ref what) if what.contains("Withdraw")));
}

#[tokio::test]
async fn test_open_account_returns_alert() {
    let state = state();
    state
        .lock()
        .alerts
        .push_back("Account created successfully with account Number :1016".to_string());
    let session = FakeSession::new(state.clone());
    let pages = Pages::new(&session, WAIT);

    let alert = pages
        .manager
        .open_account("Harry Potter", "Dollar")
        .await
        .unwrap();

    assert_eq!(manager::parse_account_number(&alert), Some(1016));
    let s = state.lock();
    let customer = s.position("select:#userSelect=Harry Potter").unwrap();
    let currency = s.position("select:#currency=Dollar").unwrap();
    assert!(customer < currency);
}

#[tokio::test]
async fn test_go_home_returns_to_landing_page() {
    let state = state();
    let session = FakeSession::new(state.clone());
    let pages = Pages::new(&session, WAIT);

    pages.login.go_home().await.unwrap();
    assert_eq!(state.lock().calls, strings(&["click:button.home"]));
}

#[tokio::test]
async fn test_go_home_waits_for_landing_page() {
    let state = state();
    state.lock().hidden.insert(login::MANAGER_LOGIN.to_string());
    let session = FakeSession::new(state.clone());
    let pages = Pages::new(&session, WAIT);

    let err = pages.login.go_home().await.unwrap_err();
    assert!(matches!(err, E2eError::Timeout(ref what) if what.contains(login::MANAGER_LOGIN)));
    assert!(state.lock().position("click:button.home").is_some());
}

#[tokio::test]
async fn test_select_account_by_number() {
    let state = state();
    let session = FakeSession::new(state.clone());
    let pages = Pages::new(&session, WAIT);

    pages.customer.select_account("1005").await.unwrap();
    assert!(state.lock().position("select:#accountSelect=1005").is_some());
}
