use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoyaltySettings {
    pub id: String,
    pub points_per_dollar_spent: f64,
    pub points_value_in_dollars: f64,
    pub minimum_points_to_redeem: i64,
    /// 0 表示不限制
    pub maximum_points_per_transaction: i64,
    pub bonus_points_first_booking: i64,
    pub bonus_points_on_birthday: i64,
    /// 0 表示积分永不过期
    pub points_expiry_days: i64,
    pub is_active: bool,
    /// None 为全局配置
    pub branch_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoyaltySettings {
    /// 消费金额(美分)可获得的积分，向下取整
    pub fn points_for_amount(&self, amount_cents: i64) -> i64 {
        if amount_cents <= 0 {
            return 0;
        }
        let dollars = amount_cents as f64 / 100.0;
        // 1e-9 吸收浮点误差，避免 10.0 * 0.1 之类的结果落到 0.999…
        (dollars * self.points_per_dollar_spent + 1e-9).floor() as i64
    }

    /// 积分折算的现金价值(美分)，四舍五入
    pub fn points_value_cents(&self, points: i64) -> i64 {
        if points <= 0 {
            return 0;
        }
        (points as f64 * self.points_value_in_dollars * 100.0).round() as i64
    }

    pub fn same_scope(&self, other: &LoyaltySettings) -> bool {
        self.branch_id == other.branch_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateLoyaltySettingsRequest {
    #[schema(example = 1.0)]
    pub points_per_dollar_spent: f64,
    #[schema(example = 0.01)]
    pub points_value_in_dollars: f64,
    #[schema(example = 100)]
    pub minimum_points_to_redeem: i64,
    #[serde(default)]
    pub maximum_points_per_transaction: i64,
    #[serde(default)]
    pub bonus_points_first_booking: i64,
    #[serde(default)]
    pub bonus_points_on_birthday: i64,
    #[serde(default)]
    pub points_expiry_days: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub branch_id: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateLoyaltySettingsRequest {
    pub points_per_dollar_spent: Option<f64>,
    pub points_value_in_dollars: Option<f64>,
    pub minimum_points_to_redeem: Option<i64>,
    pub maximum_points_per_transaction: Option<i64>,
    pub bonus_points_first_booking: Option<i64>,
    pub bonus_points_on_birthday: Option<i64>,
    pub points_expiry_days: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BranchQuery {
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CalculateQuery {
    /// 消费金额(美分)
    pub amount: Option<i64>,
    pub points: Option<i64>,
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CalculationResponse {
    pub points_for_amount: i64,
    /// 积分价值(美分)
    pub points_value: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(rate: f64, value: f64) -> LoyaltySettings {
        let now = Utc::now();
        LoyaltySettings {
            id: "lys_test".to_string(),
            points_per_dollar_spent: rate,
            points_value_in_dollars: value,
            minimum_points_to_redeem: 100,
            maximum_points_per_transaction: 0,
            bonus_points_first_booking: 0,
            bonus_points_on_birthday: 0,
            points_expiry_days: 0,
            is_active: true,
            branch_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_points_for_amount_floors() {
        let s = settings(1.0, 0.01);
        assert_eq!(s.points_for_amount(1999), 19);
        assert_eq!(s.points_for_amount(2000), 20);
        assert_eq!(s.points_for_amount(0), 0);
        assert_eq!(s.points_for_amount(-500), 0);
    }

    #[test]
    fn test_points_for_amount_fractional_rate() {
        let s = settings(0.1, 0.01);
        assert_eq!(s.points_for_amount(10000), 10);
        let s = settings(1.5, 0.01);
        assert_eq!(s.points_for_amount(1000), 15);
    }

    #[test]
    fn test_points_value_cents() {
        let s = settings(1.0, 0.01);
        assert_eq!(s.points_value_cents(500), 500);
        assert_eq!(s.points_value_cents(1), 1);
        let s = settings(1.0, 0.025);
        assert_eq!(s.points_value_cents(2), 5);
        assert_eq!(s.points_value_cents(0), 0);
    }
}
