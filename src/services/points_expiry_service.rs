use crate::error::AppResult;
use crate::models::{ExpiryRunResponse, TransactionType};
use crate::store::{LedgerState, PointsDelta, Posting, Store};
use chrono::{DateTime, Duration, Utc};

/// 先进先出的积分过期：早于截止时间获得的积分，扣除此后已消耗的积分，剩余部分过期
#[derive(Clone)]
pub struct PointsExpiryService {
    store: Store,
}

/// 计算某位顾客应过期的积分：截止时间及之前获得的积分减去至今已消耗的积分
fn expiring_points(state: &LedgerState, customer_id: &str, cutoff: DateTime<Utc>) -> i64 {
    let mut earned_before_cutoff = 0i64;
    let mut consumed = 0i64;
    for tx in state.transactions_for(customer_id) {
        let (earned, spent) = tx.points_flow();
        if tx.created_at <= cutoff {
            earned_before_cutoff = earned_before_cutoff.saturating_add(earned);
        }
        consumed = consumed.saturating_add(spent);
    }

    let held = state
        .wallet(customer_id)
        .map(|w| w.loyalty_points)
        .unwrap_or(0);
    earned_before_cutoff.saturating_sub(consumed).clamp(0, held.max(0))
}

/// 有效期换算为截止时间；超出日期范围时返回 None，即没有积分过期
fn expiry_cutoff(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::try_days(days)?)
}

impl PointsExpiryService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn expire_points(&self, now: DateTime<Utc>) -> AppResult<ExpiryRunResponse> {
        let response = self
            .store
            .transact(|state| {
                let view: &LedgerState = state;
                let due: Vec<(String, i64)> = view
                    .live_customers()
                    .filter_map(|c| {
                        let days = view
                            .active_settings(c.preferred_branch_id.as_deref())
                            .map(|s| s.points_expiry_days)
                            .unwrap_or(0);
                        if days <= 0 {
                            return None;
                        }
                        let cutoff = expiry_cutoff(now, days)?;
                        let points = expiring_points(view, &c.id, cutoff);
                        (points > 0).then(|| (c.id.clone(), points))
                    })
                    .collect();

                let mut response = ExpiryRunResponse {
                    wallets_affected: 0,
                    points_expired: 0,
                };
                for (customer_id, points) in due {
                    state.post(
                        Posting {
                            customer_id,
                            transaction_type: TransactionType::PointsExpired,
                            amount: 0,
                            points: PointsDelta::expired(points),
                            description: format!("{points} points expired"),
                            reference_id: None,
                        },
                        now,
                    )?;
                    response.wallets_affected += 1;
                    response.points_expired += points;
                }
                Ok(response)
            })
            .await?;

        if response.points_expired > 0 {
            log::info!(
                "Expired {} points across {} wallets",
                response.points_expired,
                response.wallets_affected
            );
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{customer, settings};

    fn state_with_expiry(days: i64) -> LedgerState {
        let mut state = LedgerState::default();
        let mut s = settings(None, 100, 0.01);
        s.points_expiry_days = days;
        state.loyalty_settings.push(s);
        state.customers.push(customer("cus_1", "a@example.com"));
        state.create_wallet("cus_1", Utc::now()).unwrap();
        state
    }

    async fn store_with(state: LedgerState) -> Store {
        let store = Store::in_memory();
        store
            .transact(move |s| {
                *s = state;
                Ok(())
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_old_unspent_points_expire() {
        let now = Utc::now();
        let mut state = state_with_expiry(30);
        state
            .add_points("cus_1", 300, "old", None, now - Duration::days(40))
            .unwrap();
        state
            .add_points("cus_1", 50, "recent", None, now - Duration::days(5))
            .unwrap();
        state
            .redeem_points("cus_1", 100, "spent", None, now - Duration::days(3))
            .unwrap();
        let store = store_with(state).await;

        let response = PointsExpiryService::new(store.clone())
            .expire_points(now)
            .await
            .unwrap();

        // 300 早于截止时间，已消耗 100，剩余 200 过期
        assert_eq!(response.points_expired, 200);
        assert_eq!(response.wallets_affected, 1);
        let wallet = store.read(|s| s.wallet("cus_1").cloned()).await.unwrap();
        assert_eq!(wallet.loyalty_points, 50);
        assert_eq!(wallet.total_points_expired, 200);
        assert!(store.read(|s| s.verify_integrity().is_clean()).await);
    }

    #[tokio::test]
    async fn test_expiry_is_not_repeated() {
        let now = Utc::now();
        let mut state = state_with_expiry(30);
        state
            .add_points("cus_1", 300, "old", None, now - Duration::days(40))
            .unwrap();
        let store = store_with(state).await;
        let service = PointsExpiryService::new(store.clone());

        assert_eq!(service.expire_points(now).await.unwrap().points_expired, 300);
        assert_eq!(service.expire_points(now).await.unwrap().points_expired, 0);
    }

    #[tokio::test]
    async fn test_no_expiry_configured() {
        let now = Utc::now();
        let mut state = state_with_expiry(0);
        state
            .add_points("cus_1", 300, "old", None, now - Duration::days(4000))
            .unwrap();
        let store = store_with(state).await;

        let response = PointsExpiryService::new(store).expire_points(now).await.unwrap();
        assert_eq!(response.points_expired, 0);
    }

    #[tokio::test]
    async fn test_fresh_points_from_mixed_purchase_survive() {
        let now = Utc::now();
        let mut state = state_with_expiry(30);
        state
            .add_points("cus_1", 200, "old", None, now - Duration::days(40))
            .unwrap();
        // 近期消费：兑换 100 积分，同时获得 50 积分
        state
            .post(
                Posting {
                    customer_id: "cus_1".to_string(),
                    transaction_type: TransactionType::ServiceBooking,
                    amount: 0,
                    points: PointsDelta {
                        earned: 50,
                        redeemed: 100,
                        expired: 0,
                    },
                    description: "Completed booking bk_1".to_string(),
                    reference_id: Some("bk_1".to_string()),
                },
                now - Duration::days(2),
            )
            .unwrap();
        let store = store_with(state).await;

        let response = PointsExpiryService::new(store.clone())
            .expire_points(now)
            .await
            .unwrap();

        assert_eq!(response.points_expired, 100);
        let wallet = store.read(|s| s.wallet("cus_1").cloned()).await.unwrap();
        assert_eq!(wallet.loyalty_points, 50);
        assert!(store.read(|s| s.verify_integrity().is_clean()).await);
    }

    #[tokio::test]
    async fn test_out_of_range_expiry_days_expire_nothing() {
        let now = Utc::now();
        let mut state = state_with_expiry(1_000_000_000);
        state
            .add_points("cus_1", 300, "old", None, now - Duration::days(400))
            .unwrap();
        let store = store_with(state).await;

        let response = PointsExpiryService::new(store).expire_points(now).await.unwrap();
        assert_eq!(response.points_expired, 0);
        assert_eq!(expiry_cutoff(now, i64::MAX), None);
    }

    #[test]
    fn test_expiring_points_never_exceeds_balance() {
        let now = Utc::now();
        let mut state = state_with_expiry(30);
        state
            .add_points("cus_1", 100, "old", None, now - Duration::days(60))
            .unwrap();
        // 直接篡改余额模拟不一致的数据
        state.wallets[0].loyalty_points = 40;
        assert_eq!(
            expiring_points(&state, "cus_1", now - Duration::days(30)),
            40
        );
    }
}
