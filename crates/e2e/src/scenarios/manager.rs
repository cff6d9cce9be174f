//! Bank manager flows

use futures::future::BoxFuture;
use futures::FutureExt;
use uuid::Uuid;

use super::Scenario;
use crate::error::E2eResult;
use crate::expect::{expect_contains, expect_eq, expect_true};
use crate::lifecycle::{TestContext, TestInfo};
use crate::pages::manager::{parse_account_number, parse_customer_id};
use crate::pages::Pages;

pub const SUITE: &str = "BankManagerTests";

pub fn scenarios() -> Vec<Scenario> {
    let info = |name: &str, extra: &[&str]| {
        TestInfo::new(SUITE, name).with_tags(["manager"].iter().chain(extra).copied())
    };

    vec![
        Scenario::new(
            info("add_customer_shows_confirmation", &["smoke"]),
            add_customer_shows_confirmation,
        ),
        Scenario::new(info("added_customer_is_searchable", &[]), added_customer_is_searchable),
        Scenario::new(
            info("open_account_for_new_customer", &["smoke"]),
            open_account_for_new_customer,
        ),
        Scenario::new(info("delete_customer", &[]), delete_customer),
    ]
}

/// A customer no earlier run has created
struct NewCustomer {
    first_name: String,
    last_name: String,
    post_code: String,
}

impl NewCustomer {
    fn generate() -> Self {
        let tag = Uuid::new_v4().simple().to_string();
        Self {
            first_name: format!("Ada{}", &tag[..6]),
            last_name: "Lovelace".to_string(),
            post_code: format!("E{}", &tag[6..11]),
        }
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

async fn add(pages: &Pages<'_>, customer: &NewCustomer) -> E2eResult<String> {
    pages.login.open_manager_login().await?;
    pages
        .manager
        .add_customer(&customer.first_name, &customer.last_name, &customer.post_code)
        .await
}

fn add_customer_shows_confirmation(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        let alert = add(&pages, &NewCustomer::generate()).await?;

        expect_contains(&alert, "Customer added successfully")?;
        expect_true(parse_customer_id(&alert).is_some(), "a customer id in the alert")
    }
    .boxed()
}

fn added_customer_is_searchable(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        let customer = NewCustomer::generate();
        add(&pages, &customer).await?;

        pages.manager.open_customers().await?;
        pages.manager.search_customers(&customer.first_name).await?;
        let rows = pages.manager.customer_rows().await?;

        expect_eq(rows.len(), 1)?;
        expect_eq(rows[0].full_name(), customer.full_name())?;
        expect_eq(rows[0].post_code.as_str(), customer.post_code.as_str())
    }
    .boxed()
}

fn open_account_for_new_customer(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        let customer = NewCustomer::generate();
        add(&pages, &customer).await?;

        let alert = pages
            .manager
            .open_account(&customer.full_name(), "Dollar")
            .await?;
        expect_contains(&alert, "Account created successfully")?;
        let Some(number) = parse_account_number(&alert) else {
            return expect_true(false, "an account number in the alert");
        };

        pages.manager.open_customers().await?;
        pages.manager.search_customers(&customer.first_name).await?;
        let rows = pages.manager.customer_rows().await?;
        expect_true(
            rows.iter()
                .any(|row| row.account_numbers.contains(&number.to_string())),
            &format!("account {} listed for {}", number, customer.full_name()),
        )
    }
    .boxed()
}

fn delete_customer(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        let customer = NewCustomer::generate();
        add(&pages, &customer).await?;

        pages.manager.open_customers().await?;
        pages.manager.search_customers(&customer.first_name).await?;
        pages.manager.delete_customer(&customer.first_name).await?;

        let remaining = pages.manager.customer_rows().await?;
        expect_eq(remaining.len(), 0)
    }
    .boxed()
}
