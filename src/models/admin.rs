use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 账本一致性检查结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IntegrityReport {
    pub customers: usize,
    pub wallets: usize,
    pub transactions: usize,
    /// 没有对应顾客的钱包
    pub orphaned_wallets: Vec<String>,
    /// 没有对应钱包的流水
    pub orphaned_transactions: Vec<String>,
    /// before/after 与变动值不符的流水
    pub inconsistent_transactions: Vec<String>,
    /// 余额或积分为负的钱包
    pub negative_wallets: Vec<String>,
    /// 与流水回放结果不一致的钱包
    pub drifted_wallets: Vec<String>,
    /// 同一顾客存在多个钱包
    pub duplicate_wallets: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_wallets.is_empty()
            && self.orphaned_transactions.is_empty()
            && self.inconsistent_transactions.is_empty()
            && self.negative_wallets.is_empty()
            && self.drifted_wallets.is_empty()
            && self.duplicate_wallets.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BirthdayRunRequest {
    /// 缺省为今天(UTC)
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BirthdayRunResponse {
    pub date: NaiveDate,
    pub granted: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpiryRunResponse {
    pub wallets_affected: i64,
    pub points_expired: i64,
}
