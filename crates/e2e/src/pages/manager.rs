//! Bank manager dashboard: customers and accounts

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use super::PageDriver;
use crate::error::{E2eError, E2eResult};

pub const ADD_CUSTOMER_TAB: &str = "button[ng-click='addCust()']";
pub const OPEN_ACCOUNT_TAB: &str = "button[ng-click='openAccount()']";
pub const CUSTOMERS_TAB: &str = "button[ng-click='showCust()']";

pub const FIRST_NAME: &str = "input[ng-model='fName']";
pub const LAST_NAME: &str = "input[ng-model='lName']";
pub const POST_CODE: &str = "input[ng-model='postCd']";
pub const SUBMIT: &str = "form button[type='submit']";

pub const CUSTOMER_SELECT: &str = "#userSelect";
pub const CURRENCY_SELECT: &str = "#currency";

pub const SEARCH: &str = "input[ng-model='searchCustomer']";
pub const CUSTOMER_ROWS: &str = "table tbody tr";

/// One row of the customers table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRow {
    pub first_name: String,
    pub last_name: String,
    pub post_code: String,
    pub account_numbers: Vec<String>,
}

impl CustomerRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub struct ManagerPage<'a> {
    driver: PageDriver<'a>,
}

impl<'a> ManagerPage<'a> {
    pub fn new(driver: PageDriver<'a>) -> Self {
        Self { driver }
    }

    pub async fn open_add_customer(&self) -> E2eResult<()> {
        self.driver.click(ADD_CUSTOMER_TAB).await?;
        self.driver.wait_visible(FIRST_NAME).await
    }

    /// Submit the add-customer form and return the confirmation alert
    pub async fn add_customer(
        &self,
        first_name: &str,
        last_name: &str,
        post_code: &str,
    ) -> E2eResult<String> {
        self.open_add_customer().await?;
        self.driver.type_into(FIRST_NAME, first_name).await?;
        self.driver.type_into(LAST_NAME, last_name).await?;
        self.driver.type_into(POST_CODE, post_code).await?;
        self.driver.click(SUBMIT).await?;

        let alert = self.driver.wait_for_alert().await?;
        info!("Add customer {} {}: {}", first_name, last_name, alert);
        Ok(alert)
    }

    /// Open an account for `customer` (full name) and return the alert
    pub async fn open_account(&self, customer: &str, currency: &str) -> E2eResult<String> {
        self.driver.click(OPEN_ACCOUNT_TAB).await?;
        self.driver.select(CUSTOMER_SELECT, customer).await?;
        self.driver.select(CURRENCY_SELECT, currency).await?;
        self.driver.click(SUBMIT).await?;

        let alert = self.driver.wait_for_alert().await?;
        info!("Open {} account for {}: {}", currency, customer, alert);
        Ok(alert)
    }

    pub async fn open_customers(&self) -> E2eResult<()> {
        self.driver.click(CUSTOMERS_TAB).await?;
        self.driver.wait_visible(SEARCH).await
    }

    pub async fn search_customers(&self, term: &str) -> E2eResult<()> {
        debug!("Searching customers for '{}'", term);
        self.driver.type_into(SEARCH, term).await
    }

    /// Rows currently shown in the customers table
    pub async fn customer_rows(&self) -> E2eResult<Vec<CustomerRow>> {
        let column = |n: usize| format!("{} td:nth-child({})", CUSTOMER_ROWS, n);
        let first = self.driver.texts(&column(1)).await?;
        let last = self.driver.texts(&column(2)).await?;
        let post = self.driver.texts(&column(3)).await?;
        let accounts = self.driver.texts(&column(4)).await?;

        if [last.len(), post.len(), accounts.len()].iter().any(|&n| n != first.len()) {
            return Err(E2eError::UnexpectedContent(
                "customers table has ragged columns".to_string(),
            ));
        }

        Ok(first
            .into_iter()
            .zip(last)
            .zip(post)
            .zip(accounts)
            .map(|(((first_name, last_name), post_code), accounts)| CustomerRow {
                first_name,
                last_name,
                post_code,
                account_numbers: accounts.split_whitespace().map(str::to_string).collect(),
            })
            .collect())
    }

    /// Delete the first customer row with this first name
    pub async fn delete_customer(&self, first_name: &str) -> E2eResult<()> {
        let rows = self.customer_rows().await?;
        let index = rows
            .iter()
            .position(|row| row.first_name == first_name)
            .ok_or_else(|| E2eError::ElementNotFound(format!("customer row '{}'", first_name)))?;

        let button = format!(
            "{}:nth-child({}) button[ng-click='deleteCust(cust)']",
            CUSTOMER_ROWS,
            index + 1
        );
        info!("Deleting customer '{}'", first_name);
        self.driver.click(&button).await
    }
}

static CUSTOMER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)customer id\s*:\s*(\d+)").expect("valid regex"));

static ACCOUNT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)account number\s*:\s*(\d+)").expect("valid regex"));

/// Customer id from "Customer added successfully with customer id :6"
pub fn parse_customer_id(alert: &str) -> Option<u32> {
    CUSTOMER_ID.captures(alert)?.get(1)?.as_str().parse().ok()
}

/// Account number from "Account created successfully with account Number :1016"
pub fn parse_account_number(alert: &str) -> Option<u32> {
    ACCOUNT_NUMBER.captures(alert)?.get(1)?.as_str().parse().ok()
}
