use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Transaction, TransactionType, Wallet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    /// 服务预约
    Booking,
    /// 商品订单
    Product,
}

impl PurchaseKind {
    pub fn transaction_type(self) -> TransactionType {
        match self {
            PurchaseKind::Booking => TransactionType::ServiceBooking,
            PurchaseKind::Product => TransactionType::ProductPurchase,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Wallet,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompletePurchaseRequest {
    pub customer_id: String,
    pub kind: PurchaseKind,
    /// 预约号或订单号
    pub reference_id: String,
    /// 订单总额(美分)
    #[schema(example = 4500)]
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    /// mixed 支付时从钱包扣除的金额(美分)
    pub wallet_amount: Option<i64>,
    /// 用积分抵扣
    pub points_to_redeem: Option<i64>,
    pub branch_id: Option<String>,
}

impl std::fmt::Display for PurchaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseKind::Booking => write!(f, "booking"),
            PurchaseKind::Product => write!(f, "product order"),
        }
    }
}

/// 已入账的预约/订单，用于幂等判断与退款
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseRecord {
    pub customer_id: String,
    pub kind: PurchaseKind,
    pub reference_id: String,
    pub transaction_id: String,
    pub total_amount: i64,
    pub points_earned: i64,
    pub points_redeemed: i64,
    /// 积分抵扣金额(美分)
    pub points_discount: i64,
    pub wallet_paid: i64,
    /// 需在店内另行收取的现金(美分)
    pub cash_due: i64,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub refund_transaction_id: Option<String>,
}

impl PurchaseRecord {
    pub fn is_refunded(&self) -> bool {
        self.refund_transaction_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseReceipt {
    pub purchase: PurchaseRecord,
    pub transaction: Transaction,
    pub wallet: Wallet,
    /// 同一笔订单重复提交时为 true
    pub already_processed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefundReceipt {
    pub purchase: PurchaseRecord,
    pub transaction: Transaction,
    pub wallet: Wallet,
    /// 冲回的已获积分
    pub points_reversed: i64,
    /// 退还的已抵扣积分
    pub points_restored: i64,
    pub wallet_refunded: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefundPurchaseRequest {
    pub customer_id: String,
    pub kind: PurchaseKind,
    pub reference_id: String,
}
