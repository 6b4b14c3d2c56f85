use crate::config::LoyaltyDefaults;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::store::{LedgerState, Store};
use crate::utils::{LOYALTY_SETTINGS_PREFIX, generate_id};
use chrono::Utc;

/// 积分有效期上限(天)
pub const MAX_POINTS_EXPIRY_DAYS: i64 = 36_500;

#[derive(Clone)]
pub struct LoyaltySettingsService {
    store: Store,
}

fn validate_settings(settings: &LoyaltySettings) -> AppResult<()> {
    let rates = [
        ("points_per_dollar_spent", settings.points_per_dollar_spent),
        ("points_value_in_dollars", settings.points_value_in_dollars),
    ];
    for (name, value) in rates {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::ValidationError(format!(
                "{name} must be a non-negative number"
            )));
        }
    }

    let counts = [
        ("minimum_points_to_redeem", settings.minimum_points_to_redeem),
        (
            "maximum_points_per_transaction",
            settings.maximum_points_per_transaction,
        ),
        (
            "bonus_points_first_booking",
            settings.bonus_points_first_booking,
        ),
        ("bonus_points_on_birthday", settings.bonus_points_on_birthday),
        ("points_expiry_days", settings.points_expiry_days),
    ];
    for (name, value) in counts {
        if value < 0 {
            return Err(AppError::ValidationError(format!(
                "{name} must not be negative"
            )));
        }
    }

    if settings.points_expiry_days > MAX_POINTS_EXPIRY_DAYS {
        return Err(AppError::ValidationError(format!(
            "points_expiry_days must not exceed {MAX_POINTS_EXPIRY_DAYS}"
        )));
    }

    if settings.maximum_points_per_transaction > 0
        && settings.maximum_points_per_transaction < settings.minimum_points_to_redeem
    {
        return Err(AppError::ValidationError(
            "maximum_points_per_transaction must not be below minimum_points_to_redeem"
                .to_string(),
        ));
    }
    Ok(())
}

/// 同一作用域(门店或全局)内只保留一个生效配置
fn deactivate_others_in_scope(state: &mut LedgerState, keep: &LoyaltySettings) {
    let now = Utc::now();
    for other in state
        .loyalty_settings
        .iter_mut()
        .filter(|s| s.id != keep.id && s.is_active && s.same_scope(keep))
    {
        log::info!(
            "Deactivating loyalty settings {} superseded by {}",
            other.id,
            keep.id
        );
        other.is_active = false;
        other.updated_at = now;
    }
}

impl LoyaltySettingsService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// 门店配置优先，回退到全局配置；都没有时返回 None，表示积分计划不可用
    pub async fn get_active_loyalty_settings(
        &self,
        branch_id: Option<&str>,
    ) -> Option<LoyaltySettings> {
        self.store
            .read(|state| state.active_settings(branch_id).cloned())
            .await
    }

    pub async fn calculate_points_for_amount(&self, amount: i64, branch_id: Option<&str>) -> i64 {
        self.get_active_loyalty_settings(branch_id)
            .await
            .map(|s| s.points_for_amount(amount))
            .unwrap_or(0)
    }

    /// 返回积分价值(美分)
    pub async fn calculate_points_value(&self, points: i64, branch_id: Option<&str>) -> i64 {
        self.get_active_loyalty_settings(branch_id)
            .await
            .map(|s| s.points_value_cents(points))
            .unwrap_or(0)
    }

    pub async fn list_settings(&self) -> Vec<LoyaltySettings> {
        self.store
            .read(|state| state.loyalty_settings.clone())
            .await
    }

    pub async fn get_settings(&self, id: &str) -> AppResult<LoyaltySettings> {
        self.store
            .read(|state| state.settings(id).cloned())
            .await
            .ok_or_else(|| AppError::NotFound(format!("Loyalty settings not found: {id}")))
    }

    pub async fn create_settings(
        &self,
        request: CreateLoyaltySettingsRequest,
    ) -> AppResult<LoyaltySettings> {
        let now = Utc::now();
        let settings = LoyaltySettings {
            id: generate_id(LOYALTY_SETTINGS_PREFIX),
            points_per_dollar_spent: request.points_per_dollar_spent,
            points_value_in_dollars: request.points_value_in_dollars,
            minimum_points_to_redeem: request.minimum_points_to_redeem,
            maximum_points_per_transaction: request.maximum_points_per_transaction,
            bonus_points_first_booking: request.bonus_points_first_booking,
            bonus_points_on_birthday: request.bonus_points_on_birthday,
            points_expiry_days: request.points_expiry_days,
            is_active: request.is_active,
            branch_id: request
                .branch_id
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            created_at: now,
            updated_at: now,
        };
        validate_settings(&settings)?;

        let created = settings.clone();
        self.store
            .transact(move |state| {
                if settings.is_active {
                    deactivate_others_in_scope(state, &settings);
                }
                state.loyalty_settings.push(settings);
                Ok(())
            })
            .await?;

        log::info!(
            "Created loyalty settings {} (branch: {:?}, active: {})",
            created.id,
            created.branch_id,
            created.is_active
        );
        Ok(created)
    }

    pub async fn update_settings(
        &self,
        id: &str,
        request: UpdateLoyaltySettingsRequest,
    ) -> AppResult<LoyaltySettings> {
        let id = id.to_string();
        self.store
            .transact(move |state| {
                let mut updated = state
                    .settings(&id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("Loyalty settings not found: {id}")))?;

                if let Some(v) = request.points_per_dollar_spent {
                    updated.points_per_dollar_spent = v;
                }
                if let Some(v) = request.points_value_in_dollars {
                    updated.points_value_in_dollars = v;
                }
                if let Some(v) = request.minimum_points_to_redeem {
                    updated.minimum_points_to_redeem = v;
                }
                if let Some(v) = request.maximum_points_per_transaction {
                    updated.maximum_points_per_transaction = v;
                }
                if let Some(v) = request.bonus_points_first_booking {
                    updated.bonus_points_first_booking = v;
                }
                if let Some(v) = request.bonus_points_on_birthday {
                    updated.bonus_points_on_birthday = v;
                }
                if let Some(v) = request.points_expiry_days {
                    updated.points_expiry_days = v;
                }
                if let Some(v) = request.is_active {
                    updated.is_active = v;
                }
                updated.updated_at = Utc::now();
                validate_settings(&updated)?;

                if updated.is_active {
                    deactivate_others_in_scope(state, &updated);
                }
                if let Some(slot) = state.loyalty_settings.iter_mut().find(|s| s.id == id) {
                    *slot = updated.clone();
                }
                Ok(updated)
            })
            .await
    }

    pub async fn delete_settings(&self, id: &str) -> AppResult<()> {
        let id = id.to_string();
        self.store
            .transact(move |state| {
                let before = state.loyalty_settings.len();
                state.loyalty_settings.retain(|s| s.id != id);
                if state.loyalty_settings.len() == before {
                    return Err(AppError::NotFound(format!(
                        "Loyalty settings not found: {id}"
                    )));
                }
                Ok(())
            })
            .await
    }

    /// 没有任何积分配置时写入全局默认配置
    pub async fn seed_default(&self, defaults: &LoyaltyDefaults) -> AppResult<Option<LoyaltySettings>> {
        if !defaults.seed_default {
            return Ok(None);
        }
        if self.store.read(|state| !state.loyalty_settings.is_empty()).await {
            return Ok(None);
        }

        let created = self
            .create_settings(CreateLoyaltySettingsRequest {
                points_per_dollar_spent: defaults.points_per_dollar_spent,
                points_value_in_dollars: defaults.points_value_in_dollars,
                minimum_points_to_redeem: defaults.minimum_points_to_redeem,
                maximum_points_per_transaction: defaults.maximum_points_per_transaction,
                bonus_points_first_booking: defaults.bonus_points_first_booking,
                bonus_points_on_birthday: defaults.bonus_points_on_birthday,
                points_expiry_days: defaults.points_expiry_days,
                is_active: true,
                branch_id: None,
            })
            .await?;
        Ok(Some(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(branch_id: Option<&str>, rate: f64) -> CreateLoyaltySettingsRequest {
        CreateLoyaltySettingsRequest {
            points_per_dollar_spent: rate,
            points_value_in_dollars: 0.01,
            minimum_points_to_redeem: 100,
            maximum_points_per_transaction: 0,
            bonus_points_first_booking: 0,
            bonus_points_on_birthday: 0,
            points_expiry_days: 0,
            is_active: true,
            branch_id: branch_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_branch_settings_take_precedence() {
        let service = LoyaltySettingsService::new(Store::in_memory());
        let global = service.create_settings(request(None, 1.0)).await.unwrap();
        let branch = service
            .create_settings(request(Some("uptown"), 2.0))
            .await
            .unwrap();

        let resolved = service.get_active_loyalty_settings(Some("uptown")).await.unwrap();
        assert_eq!(resolved.id, branch.id);
        let fallback = service.get_active_loyalty_settings(Some("downtown")).await.unwrap();
        assert_eq!(fallback.id, global.id);
        let plain = service.get_active_loyalty_settings(None).await.unwrap();
        assert_eq!(plain.id, global.id);
    }

    #[tokio::test]
    async fn test_no_settings_means_unavailable() {
        let service = LoyaltySettingsService::new(Store::in_memory());
        assert!(service.get_active_loyalty_settings(None).await.is_none());
        assert_eq!(service.calculate_points_for_amount(5000, None).await, 0);
        assert_eq!(service.calculate_points_value(500, None).await, 0);
    }

    #[tokio::test]
    async fn test_inactive_settings_are_ignored() {
        let service = LoyaltySettingsService::new(Store::in_memory());
        let mut inactive = request(None, 1.0);
        inactive.is_active = false;
        service.create_settings(inactive).await.unwrap();
        assert!(service.get_active_loyalty_settings(None).await.is_none());
    }

    #[tokio::test]
    async fn test_calculations_use_resolved_settings() {
        let service = LoyaltySettingsService::new(Store::in_memory());
        service.create_settings(request(None, 1.0)).await.unwrap();
        service
            .create_settings(request(Some("uptown"), 3.0))
            .await
            .unwrap();

        assert_eq!(service.calculate_points_for_amount(4599, None).await, 45);
        assert_eq!(
            service.calculate_points_for_amount(4599, Some("uptown")).await,
            137
        );
        assert_eq!(service.calculate_points_value(500, None).await, 500);
    }

    #[tokio::test]
    async fn test_activating_deactivates_same_scope_only() {
        let service = LoyaltySettingsService::new(Store::in_memory());
        let first = service.create_settings(request(None, 1.0)).await.unwrap();
        let branch = service
            .create_settings(request(Some("uptown"), 2.0))
            .await
            .unwrap();
        let second = service.create_settings(request(None, 1.5)).await.unwrap();

        let all = service.list_settings().await;
        let active: Vec<_> = all.iter().filter(|s| s.is_active).map(|s| s.id.clone()).collect();
        assert!(active.contains(&second.id));
        assert!(active.contains(&branch.id));
        assert!(!active.contains(&first.id));

        // 重新启用旧配置
        service
            .update_settings(
                &first.id,
                UpdateLoyaltySettingsRequest {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let resolved = service.get_active_loyalty_settings(None).await.unwrap();
        assert_eq!(resolved.id, first.id);
        assert!(!service.get_settings(&second.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_values() {
        let service = LoyaltySettingsService::new(Store::in_memory());
        let mut bad = request(None, f64::NAN);
        assert!(service.create_settings(bad.clone()).await.is_err());

        bad.points_per_dollar_spent = 1.0;
        bad.maximum_points_per_transaction = 50;
        assert!(matches!(
            service.create_settings(bad).await,
            Err(AppError::ValidationError(_))
        ));

        let created = service.create_settings(request(None, 1.0)).await.unwrap();
        let err = service
            .update_settings(
                &created.id,
                UpdateLoyaltySettingsRequest {
                    minimum_points_to_redeem: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(
            service.get_settings(&created.id).await.unwrap().minimum_points_to_redeem,
            100
        );
    }

    #[tokio::test]
    async fn test_expiry_days_upper_bound() {
        let service = LoyaltySettingsService::new(Store::in_memory());
        let mut huge = request(None, 1.0);
        huge.points_expiry_days = 1_000_000_000;
        assert!(matches!(
            service.create_settings(huge).await,
            Err(AppError::ValidationError(_))
        ));

        let mut longest = request(None, 1.0);
        longest.points_expiry_days = MAX_POINTS_EXPIRY_DAYS;
        let created = service.create_settings(longest).await.unwrap();
        assert!(
            service
                .update_settings(
                    &created.id,
                    UpdateLoyaltySettingsRequest {
                        points_expiry_days: Some(MAX_POINTS_EXPIRY_DAYS + 1),
                        ..Default::default()
                    },
                )
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_delete_settings() {
        let service = LoyaltySettingsService::new(Store::in_memory());
        let created = service.create_settings(request(None, 1.0)).await.unwrap();
        service.delete_settings(&created.id).await.unwrap();
        assert!(matches!(
            service.delete_settings(&created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.list_settings().await.is_empty());
    }

    #[tokio::test]
    async fn test_seed_default_only_once() {
        let service = LoyaltySettingsService::new(Store::in_memory());
        let defaults = LoyaltyDefaults::default();
        assert!(service.seed_default(&defaults).await.unwrap().is_some());
        assert!(service.seed_default(&defaults).await.unwrap().is_none());
        assert_eq!(service.list_settings().await.len(), 1);
    }
}
