use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    ServiceBooking,
    ProductPurchase,
    PointsEarned,
    PointsRedeemed,
    WalletTopup,
    WalletPayment,
    Refund,
    PointsExpired,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::ServiceBooking => write!(f, "service_booking"),
            TransactionType::ProductPurchase => write!(f, "product_purchase"),
            TransactionType::PointsEarned => write!(f, "points_earned"),
            TransactionType::PointsRedeemed => write!(f, "points_redeemed"),
            TransactionType::WalletTopup => write!(f, "wallet_topup"),
            TransactionType::WalletPayment => write!(f, "wallet_payment"),
            TransactionType::Refund => write!(f, "refund"),
            TransactionType::PointsExpired => write!(f, "points_expired"),
        }
    }
}

/// 只追加的流水记录，写入后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: String,
    pub customer_id: String,
    pub transaction_type: TransactionType,
    /// 余额变动(美分)，扣款为负数
    pub amount: i64,
    /// 积分变动，扣减为负数
    pub points_amount: i64,
    /// points_amount 的拆分：新获得(退款冲回为负)、兑换(退还为负)、过期
    #[serde(default)]
    pub points_earned: i64,
    #[serde(default)]
    pub points_redeemed: i64,
    #[serde(default)]
    pub points_expired: i64,
    pub description: String,
    pub reference_id: Option<String>,
    pub balance_before: i64,
    pub balance_after: i64,
    pub points_before: i64,
    pub points_after: i64,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// before/after 快照与变动值是否一致
    pub fn is_consistent(&self) -> bool {
        let split_matches = !self.has_points_split()
            || self
                .points_earned
                .checked_sub(self.points_redeemed)
                .and_then(|v| v.checked_sub(self.points_expired))
                == Some(self.points_amount);
        self.balance_after - self.balance_before == self.amount
            && self.points_after - self.points_before == self.points_amount
            && split_matches
    }

    fn has_points_split(&self) -> bool {
        self.points_earned != 0 || self.points_redeemed != 0 || self.points_expired != 0
    }

    /// (获得, 消耗) 两个方向的积分；没有拆分的旧流水按净值归类
    pub fn points_flow(&self) -> (i64, i64) {
        if !self.has_points_split() {
            return if self.points_amount > 0 {
                (self.points_amount, 0)
            } else {
                (0, self.points_amount.saturating_neg())
            };
        }
        let earned = self.points_earned.max(0);
        // 冲回的获得积分算作消耗，退还的兑换积分抵减消耗
        let consumed = self
            .points_redeemed
            .saturating_add(self.points_expired)
            .saturating_add(self.points_earned.min(0).saturating_neg());
        (earned, consumed)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TransactionQuery {
    pub transaction_type: Option<TransactionType>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
