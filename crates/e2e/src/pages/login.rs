//! Landing page with the two login entry points

use tracing::debug;

use super::{customer, manager, PageDriver};
use crate::error::E2eResult;

pub const HOME_BUTTON: &str = "button.home";
pub const CUSTOMER_LOGIN: &str = "button[ng-click='customer()']";
pub const MANAGER_LOGIN: &str = "button[ng-click='manager()']";

pub struct LoginPage<'a> {
    driver: PageDriver<'a>,
}

impl<'a> LoginPage<'a> {
    pub fn new(driver: PageDriver<'a>) -> Self {
        Self { driver }
    }

    /// Go to the customer picker
    pub async fn open_customer_login(&self) -> E2eResult<()> {
        debug!("Opening customer login");
        self.driver.click(CUSTOMER_LOGIN).await?;
        self.driver.wait_visible(customer::USER_SELECT).await
    }

    /// Go to the bank manager dashboard
    pub async fn open_manager_login(&self) -> E2eResult<()> {
        debug!("Opening bank manager login");
        self.driver.click(MANAGER_LOGIN).await?;
        self.driver.wait_visible(manager::ADD_CUSTOMER_TAB).await
    }

    /// Return to the landing page from anywhere
    pub async fn go_home(&self) -> E2eResult<()> {
        self.driver.click(HOME_BUTTON).await?;
        self.driver.wait_visible(MANAGER_LOGIN).await
    }
}
