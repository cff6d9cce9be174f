//! Customer flows, run as an existing customer

use futures::future::BoxFuture;
use futures::FutureExt;

use super::Scenario;
use crate::error::E2eResult;
use crate::expect::{expect_contains, expect_eq, expect_true};
use crate::lifecycle::{TestContext, TestInfo};
use crate::pages::customer::{
    DEPOSIT_SUCCESS, USER_SELECT, WELCOME_NAME, WITHDRAW_REJECTED, WITHDRAW_SUCCESS,
};
use crate::pages::{Pages, TransactionKind};

pub const SUITE: &str = "CustomerTests";

/// Customer seeded by the demo application
pub const CUSTOMER: &str = "Harry Potter";

pub fn scenarios() -> Vec<Scenario> {
    let info = |name: &str, extra: &[&str]| {
        TestInfo::new(SUITE, name).with_tags(["customer"].iter().chain(extra).copied())
    };

    vec![
        Scenario::new(info("login_shows_welcome_name", &["smoke"]), login_shows_welcome_name),
        Scenario::new(info("deposit_updates_balance", &["smoke"]), deposit_updates_balance),
        Scenario::new(info("withdraw_within_balance", &[]), withdraw_within_balance),
        Scenario::new(info("overdraw_is_rejected", &[]), overdraw_is_rejected),
        Scenario::new(
            info("transactions_record_deposit", &[]),
            transactions_record_deposit,
        ),
        Scenario::new(info("reset_clears_transactions", &[]), reset_clears_transactions),
        Scenario::new(
            info("logout_returns_to_customer_select", &[]),
            logout_returns_to_customer_select,
        ),
    ]
}

async fn login(pages: &Pages<'_>) -> E2eResult<()> {
    pages.login.open_customer_login().await?;
    pages.customer.login_as(CUSTOMER).await
}

fn login_shows_welcome_name(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        login(&pages).await?;

        expect_eq(pages.customer.welcome_name().await?, CUSTOMER.to_string())
    }
    .boxed()
}

fn deposit_updates_balance(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        login(&pages).await?;

        let before = pages.customer.balance().await?;
        let message = pages.customer.deposit("100").await?;
        expect_contains(&message, DEPOSIT_SUCCESS)?;

        let after = pages.customer.balance().await?;
        expect_eq(after - before, 100)
    }
    .boxed()
}

fn withdraw_within_balance(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        login(&pages).await?;

        let before = pages.customer.balance().await?;
        expect_contains(&pages.customer.deposit("200").await?, DEPOSIT_SUCCESS)?;
        expect_contains(&pages.customer.withdraw("50").await?, WITHDRAW_SUCCESS)?;

        expect_eq(pages.customer.balance().await?, before + 150)
    }
    .boxed()
}

fn overdraw_is_rejected(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        login(&pages).await?;

        let before = pages.customer.balance().await?;
        let message = pages.customer.withdraw(&(before + 1).to_string()).await?;
        expect_contains(&message, WITHDRAW_REJECTED)?;

        expect_eq(pages.customer.balance().await?, before)
    }
    .boxed()
}

fn transactions_record_deposit(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        login(&pages).await?;
        expect_contains(&pages.customer.deposit("75").await?, DEPOSIT_SUCCESS)?;

        pages.customer.open_transactions().await?;
        pages.customer.wait_for_transactions(1).await?;
        let transactions = pages.customer.transactions().await?;

        expect_true(
            transactions
                .iter()
                .any(|t| t.amount == 75 && t.kind == TransactionKind::Credit),
            "a credit of 75 in the transactions table",
        )
    }
    .boxed()
}

fn reset_clears_transactions(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        login(&pages).await?;
        expect_contains(&pages.customer.deposit("10").await?, DEPOSIT_SUCCESS)?;

        pages.customer.open_transactions().await?;
        pages.customer.wait_for_transactions(1).await?;
        pages.customer.reset_transactions().await?;

        expect_eq(pages.customer.transactions().await?.len(), 0)?;
        pages.customer.back_to_account().await?;
        expect_eq(pages.customer.balance().await?, 0)
    }
    .boxed()
}

fn logout_returns_to_customer_select(ctx: &TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let pages = ctx.pages()?;
        login(&pages).await?;
        pages.customer.logout().await?;

        let session = ctx.session()?;
        expect_true(session.is_visible(USER_SELECT).await?, "the customer select")?;
        expect_true(
            !session.is_visible(WELCOME_NAME).await?,
            "the welcome name to be gone",
        )
    }
    .boxed()
}
