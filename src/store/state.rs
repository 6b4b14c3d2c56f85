use crate::error::{AppError, AppResult};
use crate::models::{Customer, LoyaltySettings, PurchaseKind, PurchaseRecord, Transaction, Wallet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 某位顾客某一年的生日积分已发放
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthdayGrant {
    pub customer_id: String,
    pub year: i32,
    pub points: i64,
    pub granted_at: DateTime<Utc>,
}

/// 整个账本的内存状态，即持久化快照的内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    /// 按追加顺序保存
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub loyalty_settings: Vec<LoyaltySettings>,
    #[serde(default)]
    pub birthday_grants: Vec<BirthdayGrant>,
    #[serde(default)]
    pub purchases: Vec<PurchaseRecord>,
}

impl LedgerState {
    /// 未删除的顾客
    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers
            .iter()
            .find(|c| c.id == id && !c.is_deleted())
    }

    pub fn customer_mut(&mut self, id: &str) -> Option<&mut Customer> {
        self.customers
            .iter_mut()
            .find(|c| c.id == id && !c.is_deleted())
    }

    pub fn require_customer(&self, id: &str) -> AppResult<&Customer> {
        self.customer(id)
            .ok_or_else(|| AppError::NotFound(format!("Customer not found: {id}")))
    }

    pub fn customer_by_email(&self, email: &str) -> Option<&Customer> {
        self.customers
            .iter()
            .find(|c| c.email == email && !c.is_deleted())
    }

    pub fn live_customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.iter().filter(|c| !c.is_deleted())
    }

    pub fn wallet(&self, customer_id: &str) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.customer_id == customer_id)
    }

    /// 只返回未删除顾客的钱包
    pub fn require_wallet(&self, customer_id: &str) -> AppResult<&Wallet> {
        self.require_customer(customer_id)?;
        self.wallet(customer_id)
            .ok_or_else(|| AppError::NotFound(format!("Wallet not found for customer {customer_id}")))
    }

    pub(crate) fn require_wallet_mut(&mut self, customer_id: &str) -> AppResult<&mut Wallet> {
        self.require_customer(customer_id)?;
        self.wallets
            .iter_mut()
            .find(|w| w.customer_id == customer_id)
            .ok_or_else(|| AppError::NotFound(format!("Wallet not found for customer {customer_id}")))
    }

    /// 按追加顺序返回某位顾客的流水
    pub fn transactions_for<'a>(
        &'a self,
        customer_id: &'a str,
    ) -> impl DoubleEndedIterator<Item = &'a Transaction> + 'a {
        self.transactions
            .iter()
            .filter(move |t| t.customer_id == customer_id)
    }

    pub fn settings(&self, id: &str) -> Option<&LoyaltySettings> {
        self.loyalty_settings.iter().find(|s| s.id == id)
    }

    /// 门店专属的生效配置优先，否则回退到全局生效配置
    pub fn active_settings(&self, branch_id: Option<&str>) -> Option<&LoyaltySettings> {
        let active_in_scope = |scope: Option<&str>| {
            self.loyalty_settings
                .iter()
                .filter(|s| s.is_active && s.branch_id.as_deref() == scope)
                .max_by_key(|s| s.updated_at)
        };

        branch_id
            .and_then(|b| active_in_scope(Some(b)))
            .or_else(|| active_in_scope(None))
    }

    pub fn require_active_settings(&self, branch_id: Option<&str>) -> AppResult<&LoyaltySettings> {
        self.active_settings(branch_id)
            .ok_or(AppError::LoyaltyUnavailable)
    }

    pub fn purchase(
        &self,
        customer_id: &str,
        kind: PurchaseKind,
        reference_id: &str,
    ) -> Option<&PurchaseRecord> {
        self.purchases.iter().find(|p| {
            p.customer_id == customer_id && p.kind == kind && p.reference_id == reference_id
        })
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn has_birthday_grant(&self, customer_id: &str, year: i32) -> bool {
        self.birthday_grants
            .iter()
            .any(|g| g.customer_id == customer_id && g.year == year)
    }
}
