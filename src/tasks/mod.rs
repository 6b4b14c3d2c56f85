//! Background scheduled tasks.
//!
//! Birthday rewards and points expiry run on their own intervals. Both jobs are
//! idempotent, so a restart or an overlapping manual run through the admin API
//! never grants or expires points twice.

use crate::config::TasksConfig;
use crate::services::{BirthdayRewardService, PointsExpiryService};
use std::time::Duration;

/// Spawn all background tasks. Detaches via `tokio::spawn` and returns immediately.
pub fn spawn_all(
    birthday_reward_service: BirthdayRewardService,
    points_expiry_service: PointsExpiryService,
    config: &TasksConfig,
) {
    // 生日积分发放
    {
        let svc = birthday_reward_service;
        let interval = Duration::from_secs(config.birthday_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                match svc.grant_today_birthdays().await {
                    Ok(n) if n > 0 => log::info!("Birthday rewards granted: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to grant birthday rewards: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    // 积分过期
    {
        let svc = points_expiry_service;
        let interval = Duration::from_secs(config.expiry_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                match svc.expire_points(chrono::Utc::now()).await {
                    Ok(r) if r.points_expired > 0 => log::info!(
                        "Points expired: {} across {} wallets",
                        r.points_expired,
                        r.wallets_affected
                    ),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to expire points: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }
}
