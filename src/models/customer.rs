use crate::models::Wallet;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub preferred_branch_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 软删除时间，非空表示已删除
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// 名称、邮箱、手机号的不区分大小写子串匹配
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.email.contains(&needle)
            || self
                .phone
                .as_deref()
                .is_some_and(|p| p.contains(&needle))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterCustomerRequest {
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "+12345678901")]
    pub phone: Option<String>,
    #[schema(example = "1990-01-01")]
    pub birthday: Option<String>, // YYYY-MM-DD
    #[schema(example = "downtown")]
    pub preferred_branch_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "1990-01-01")]
    pub birthday: Option<String>,
    pub preferred_branch_id: Option<String>,
    pub notes: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.phone.is_none()
            && self.birthday.is_none()
            && self.preferred_branch_id.is_none()
            && self.notes.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerProfileResponse {
    pub customer: Customer,
    pub wallet: Option<Wallet>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterCustomerResponse {
    pub customer: Customer,
    pub wallet: Wallet,
    /// 注册时发放的首单奖励积分
    pub bonus_points: i64,
}
