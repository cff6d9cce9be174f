//! Customer account view: deposits, withdrawals and transactions

use tracing::{debug, info};

use super::PageDriver;
use crate::error::{E2eError, E2eResult};

pub const USER_SELECT: &str = "#userSelect";
pub const LOGIN_BUTTON: &str = "form button[type='submit']";
pub const WELCOME_NAME: &str = "span.fontBig";
pub const ACCOUNT_SELECT: &str = "#accountSelect";
pub const ACCOUNT_INFO: &str = "div.center strong.ng-binding";

pub const DEPOSIT_TAB: &str = "button[ng-click='deposit()']";
pub const WITHDRAW_TAB: &str = "button[ng-click='withdrawl()']";
pub const TRANSACTIONS_TAB: &str = "button[ng-click='transactions()']";

pub const AMOUNT: &str = "input[ng-model='amount']";
pub const FORM_SUBMIT: &str = "form[name='myForm'] button[type='submit']";
pub const MESSAGE: &str = "span.error";
pub const LOGOUT: &str = "button.logout";

pub const TRANSACTION_ROWS: &str = "table tbody tr";
pub const RESET: &str = "button[ng-click='reset()']";
pub const BACK: &str = "button[ng-click='back()']";

pub const DEPOSIT_SUCCESS: &str = "Deposit Successful";
pub const WITHDRAW_SUCCESS: &str = "Transaction successful";
pub const WITHDRAW_REJECTED: &str =
    "Transaction Failed. You can not withdraw amount more than the balance.";

/// The "Account Number : 1004 , Balance : 0 , Currency : Dollar" line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub number: String,
    pub balance: i64,
    pub currency: String,
}

impl AccountSummary {
    fn parse(cells: &[String]) -> E2eResult<Self> {
        let [number, balance, currency] = cells else {
            return Err(E2eError::UnexpectedContent(format!(
                "account line has {} fields, expected 3",
                cells.len()
            )));
        };
        let balance = balance.trim().parse().map_err(|_| {
            E2eError::UnexpectedContent(format!("balance '{}' is not a number", balance))
        })?;

        Ok(Self {
            number: number.trim().to_string(),
            balance,
            currency: currency.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl std::str::FromStr for TransactionKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Credit" => Ok(TransactionKind::Credit),
            "Debit" => Ok(TransactionKind::Debit),
            other => Err(E2eError::UnexpectedContent(format!(
                "unknown transaction type '{}'",
                other
            ))),
        }
    }
}

/// One row of the transactions table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub date_time: String,
    pub amount: i64,
    pub kind: TransactionKind,
}

pub struct CustomerPage<'a> {
    driver: PageDriver<'a>,
}

impl<'a> CustomerPage<'a> {
    pub fn new(driver: PageDriver<'a>) -> Self {
        Self { driver }
    }

    /// Pick `name` from the customer list and log in
    pub async fn login_as(&self, name: &str) -> E2eResult<()> {
        info!("Logging in as {}", name);
        self.driver.select(USER_SELECT, name).await?;
        self.driver.click(LOGIN_BUTTON).await?;
        self.driver.wait_visible(WELCOME_NAME).await
    }

    pub async fn welcome_name(&self) -> E2eResult<String> {
        self.driver.text(WELCOME_NAME).await
    }

    pub async fn select_account(&self, number: &str) -> E2eResult<()> {
        self.driver.select(ACCOUNT_SELECT, number).await
    }

    pub async fn account_summary(&self) -> E2eResult<AccountSummary> {
        self.driver.wait_visible(ACCOUNT_INFO).await?;
        AccountSummary::parse(&self.driver.texts(ACCOUNT_INFO).await?)
    }

    pub async fn balance(&self) -> E2eResult<i64> {
        Ok(self.account_summary().await?.balance)
    }

    /// Deposit `amount` and return the status message
    pub async fn deposit(&self, amount: &str) -> E2eResult<String> {
        self.driver.click(DEPOSIT_TAB).await?;
        self.driver.wait_for_text(FORM_SUBMIT, "Deposit").await?;
        self.submit_amount(amount).await
    }

    /// Withdraw `amount` and return the status message
    pub async fn withdraw(&self, amount: &str) -> E2eResult<String> {
        self.driver.click(WITHDRAW_TAB).await?;
        self.driver.wait_for_text(FORM_SUBMIT, "Withdraw").await?;
        self.submit_amount(amount).await
    }

    async fn submit_amount(&self, amount: &str) -> E2eResult<String> {
        self.driver.type_into(AMOUNT, amount).await?;
        self.driver.click(FORM_SUBMIT).await?;
        let message = self.driver.wait_for_any_text(MESSAGE).await?;
        debug!("Amount {} submitted: {}", amount, message);
        Ok(message)
    }

    pub async fn open_transactions(&self) -> E2eResult<()> {
        self.driver.click(TRANSACTIONS_TAB).await?;
        self.driver.wait_visible(BACK).await
    }

    /// Wait until the table lists at least `min` transactions
    pub async fn wait_for_transactions(&self, min: usize) -> E2eResult<usize> {
        self.driver.wait_for_count(TRANSACTION_ROWS, min).await
    }

    /// Rows currently shown in the transactions table
    pub async fn transactions(&self) -> E2eResult<Vec<Transaction>> {
        let column = |n: usize| format!("{} td:nth-child({})", TRANSACTION_ROWS, n);
        let dates = self.driver.texts(&column(1)).await?;
        let amounts = self.driver.texts(&column(2)).await?;
        let kinds = self.driver.texts(&column(3)).await?;

        if amounts.len() != dates.len() || kinds.len() != dates.len() {
            return Err(E2eError::UnexpectedContent(
                "transactions table has ragged columns".to_string(),
            ));
        }

        dates
            .into_iter()
            .zip(amounts)
            .zip(kinds)
            .map(|((date_time, amount), kind)| {
                Ok(Transaction {
                    amount: amount.trim().parse().map_err(|_| {
                        E2eError::UnexpectedContent(format!("amount '{}' is not a number", amount))
                    })?,
                    kind: kind.parse()?,
                    date_time,
                })
            })
            .collect()
    }

    pub async fn reset_transactions(&self) -> E2eResult<()> {
        info!("Resetting transactions");
        self.driver.click(RESET).await
    }

    pub async fn back_to_account(&self) -> E2eResult<()> {
        self.driver.click(BACK).await?;
        self.driver.wait_visible(ACCOUNT_INFO).await
    }

    pub async fn logout(&self) -> E2eResult<()> {
        self.driver.click(LOGOUT).await?;
        self.driver.wait_visible(USER_SELECT).await
    }
}
