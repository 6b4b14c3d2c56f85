use crate::error::AppResult;
use crate::store::{BirthdayGrant, Store};
use chrono::{Datelike, NaiveDate, Utc};

#[derive(Clone)]
pub struct BirthdayRewardService {
    store: Store,
}

/// 2 月 29 日出生的顾客在平年于 2 月 28 日过生日
fn celebrates_on(birthday: NaiveDate, day: NaiveDate) -> bool {
    if birthday.month() == day.month() && birthday.day() == day.day() {
        return true;
    }
    let is_leap = NaiveDate::from_ymd_opt(day.year(), 2, 29).is_some();
    birthday.month() == 2 && birthday.day() == 29 && !is_leap && day.month() == 2 && day.day() == 28
}

impl BirthdayRewardService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    // 给当天生日且今年未领取过的顾客发放生日积分；返回发放人数
    pub async fn grant_birthday_rewards(&self, today: NaiveDate) -> AppResult<i64> {
        let year = today.year();
        self.store
            .transact(|state| {
                let candidates: Vec<(String, i64)> = state
                    .live_customers()
                    .filter(|c| c.birthday.is_some_and(|b| celebrates_on(b, today)))
                    .filter(|c| !state.has_birthday_grant(&c.id, year))
                    .filter_map(|c| {
                        let points = state
                            .active_settings(c.preferred_branch_id.as_deref())
                            .map(|s| s.bonus_points_on_birthday)
                            .unwrap_or(0);
                        (points > 0).then(|| (c.id.clone(), points))
                    })
                    .collect();

                let now = Utc::now();
                let mut granted = 0i64;
                for (customer_id, points) in candidates {
                    // 钱包缺失的顾客跳过，不影响其他人
                    if state.wallet(&customer_id).is_none() {
                        log::warn!("Skipping birthday reward for {customer_id}: wallet not found");
                        continue;
                    }
                    state.add_points(
                        &customer_id,
                        points,
                        &format!("Birthday reward {year}"),
                        None,
                        now,
                    )?;
                    state.birthday_grants.push(BirthdayGrant {
                        customer_id,
                        year,
                        points,
                        granted_at: now,
                    });
                    granted += 1;
                }
                Ok(granted)
            })
            .await
    }

    pub async fn grant_today_birthdays(&self) -> AppResult<i64> {
        self.grant_birthday_rewards(Utc::now().date_naive()).await
    }
}
