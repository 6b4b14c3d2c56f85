use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Transaction;

/// 每位顾客一个钱包：现金余额(美分) + 积分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Wallet {
    pub id: String,
    pub customer_id: String,
    /// 余额(美分)
    pub balance: i64,
    pub loyalty_points: i64,
    pub total_points_earned: i64,
    pub total_points_redeemed: i64,
    #[serde(default)]
    pub total_points_expired: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(id: String, customer_id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id,
            balance: 0,
            loyalty_points: 0,
            total_points_earned: 0,
            total_points_redeemed: 0,
            total_points_expired: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PointsRequest {
    #[schema(example = 100)]
    pub points: i64,
    pub description: Option<String>,
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AmountRequest {
    /// 金额(美分)
    #[schema(example = 2000)]
    pub amount: i64,
    pub description: Option<String>,
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertPointsRequest {
    #[schema(example = 500)]
    pub points: i64,
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversionResponse {
    pub redeemed: Transaction,
    pub credited: Transaction,
    pub wallet: Wallet,
}
