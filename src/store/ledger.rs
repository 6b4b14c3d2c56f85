//! Wallet ledger operations over [`LedgerState`].
//!
//! Every balance or points change goes through [`LedgerState::post`], which
//! appends exactly one transaction whose before/after snapshots explain the
//! change. Composite operations validate everything up front so they either
//! apply completely or leave the state untouched.

use super::LedgerState;
use crate::error::{AppError, AppResult};
use crate::models::{Transaction, TransactionType, Wallet};
use crate::utils::{TRANSACTION_PREFIX, WALLET_PREFIX, generate_id};
use chrono::{DateTime, Utc};

/// 积分变动的拆分，用于维护钱包累计值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointsDelta {
    /// 新获得的积分；退款冲回时为负数
    pub earned: i64,
    pub redeemed: i64,
    pub expired: i64,
}

impl PointsDelta {
    pub fn earned(points: i64) -> Self {
        Self {
            earned: points,
            ..Default::default()
        }
    }

    pub fn redeemed(points: i64) -> Self {
        Self {
            redeemed: points,
            ..Default::default()
        }
    }

    pub fn expired(points: i64) -> Self {
        Self {
            expired: points,
            ..Default::default()
        }
    }

    /// 对 loyalty_points 的净影响
    pub fn net(&self) -> Option<i64> {
        self.earned
            .checked_sub(self.redeemed)?
            .checked_sub(self.expired)
    }
}

#[derive(Debug, Clone)]
pub struct Posting {
    pub customer_id: String,
    pub transaction_type: TransactionType,
    /// 余额变动(美分)
    pub amount: i64,
    pub points: PointsDelta,
    pub description: String,
    pub reference_id: Option<String>,
}

fn require_positive(value: i64, what: &str) -> AppResult<()> {
    if value <= 0 {
        return Err(AppError::ValidationError(format!(
            "{what} must be greater than zero"
        )));
    }
    Ok(())
}

fn overflow() -> AppError {
    AppError::ValidationError("Amount out of range".to_string())
}

impl LedgerState {
    /// 唯一的余额/积分写入口：校验、计算快照、更新钱包并追加一条流水
    pub fn post(&mut self, posting: Posting, now: DateTime<Utc>) -> AppResult<Transaction> {
        let points_amount = posting.points.net().ok_or_else(overflow)?;
        let wallet = self.require_wallet_mut(&posting.customer_id)?;

        let balance_before = wallet.balance;
        let points_before = wallet.loyalty_points;
        let balance_after = balance_before
            .checked_add(posting.amount)
            .ok_or_else(overflow)?;
        let points_after = points_before
            .checked_add(points_amount)
            .ok_or_else(overflow)?;

        if balance_after < 0 {
            return Err(AppError::InsufficientBalance {
                requested: -posting.amount,
                available: balance_before,
            });
        }
        if points_after < 0 {
            return Err(AppError::InsufficientPoints {
                requested: -points_amount,
                available: points_before,
            });
        }

        let total_earned = wallet
            .total_points_earned
            .checked_add(posting.points.earned)
            .ok_or_else(overflow)?;
        let total_redeemed = wallet
            .total_points_redeemed
            .checked_add(posting.points.redeemed)
            .ok_or_else(overflow)?;
        let total_expired = wallet
            .total_points_expired
            .checked_add(posting.points.expired)
            .ok_or_else(overflow)?;

        wallet.balance = balance_after;
        wallet.loyalty_points = points_after;
        wallet.total_points_earned = total_earned;
        wallet.total_points_redeemed = total_redeemed;
        wallet.total_points_expired = total_expired;
        wallet.updated_at = now;

        let transaction = Transaction {
            id: generate_id(TRANSACTION_PREFIX),
            customer_id: posting.customer_id,
            transaction_type: posting.transaction_type,
            amount: posting.amount,
            points_amount,
            points_earned: posting.points.earned,
            points_redeemed: posting.points.redeemed,
            points_expired: posting.points.expired,
            description: posting.description,
            reference_id: posting.reference_id,
            balance_before,
            balance_after,
            points_before,
            points_after,
            created_at: now,
        };
        self.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// 幂等：已存在则直接返回
    pub fn create_wallet(&mut self, customer_id: &str, now: DateTime<Utc>) -> AppResult<Wallet> {
        self.require_customer(customer_id)?;
        if let Some(wallet) = self.wallet(customer_id) {
            return Ok(wallet.clone());
        }

        let wallet = Wallet::new(generate_id(WALLET_PREFIX), customer_id.to_string(), now);
        self.wallets.push(wallet.clone());
        Ok(wallet)
    }

    pub fn add_points(
        &mut self,
        customer_id: &str,
        points: i64,
        description: &str,
        reference_id: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Transaction> {
        require_positive(points, "Points")?;
        self.post(
            Posting {
                customer_id: customer_id.to_string(),
                transaction_type: TransactionType::PointsEarned,
                amount: 0,
                points: PointsDelta::earned(points),
                description: description.to_string(),
                reference_id,
            },
            now,
        )
    }

    pub fn redeem_points(
        &mut self,
        customer_id: &str,
        points: i64,
        description: &str,
        reference_id: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Transaction> {
        require_positive(points, "Points")?;
        self.post(
            Posting {
                customer_id: customer_id.to_string(),
                transaction_type: TransactionType::PointsRedeemed,
                amount: 0,
                points: PointsDelta::redeemed(points),
                description: description.to_string(),
                reference_id,
            },
            now,
        )
    }

    pub fn add_to_wallet_balance(
        &mut self,
        customer_id: &str,
        amount: i64,
        description: &str,
        reference_id: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Transaction> {
        require_positive(amount, "Amount")?;
        self.post(
            Posting {
                customer_id: customer_id.to_string(),
                transaction_type: TransactionType::WalletTopup,
                amount,
                points: PointsDelta::default(),
                description: description.to_string(),
                reference_id,
            },
            now,
        )
    }

    pub fn deduct_from_wallet_balance(
        &mut self,
        customer_id: &str,
        amount: i64,
        description: &str,
        reference_id: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Transaction> {
        require_positive(amount, "Amount")?;
        self.post(
            Posting {
                customer_id: customer_id.to_string(),
                transaction_type: TransactionType::WalletPayment,
                amount: -amount,
                points: PointsDelta::default(),
                description: description.to_string(),
                reference_id,
            },
            now,
        )
    }

    pub fn refund_to_wallet(
        &mut self,
        customer_id: &str,
        amount: i64,
        description: &str,
        reference_id: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Transaction> {
        require_positive(amount, "Amount")?;
        self.post(
            Posting {
                customer_id: customer_id.to_string(),
                transaction_type: TransactionType::Refund,
                amount,
                points: PointsDelta::default(),
                description: description.to_string(),
                reference_id,
            },
            now,
        )
    }

    /// 积分兑换为钱包余额；两条流水要么都写入，要么都不写入
    pub fn convert_points_to_wallet(
        &mut self,
        customer_id: &str,
        points: i64,
        branch_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<(Transaction, Transaction)> {
        require_positive(points, "Points")?;
        let wallet = self.require_wallet(customer_id)?.clone();
        let settings = self.require_active_settings(branch_id)?;

        if points < settings.minimum_points_to_redeem {
            return Err(AppError::ValidationError(format!(
                "Minimum {} points required to redeem",
                settings.minimum_points_to_redeem
            )));
        }
        if settings.maximum_points_per_transaction > 0
            && points > settings.maximum_points_per_transaction
        {
            return Err(AppError::ValidationError(format!(
                "At most {} points can be redeemed per transaction",
                settings.maximum_points_per_transaction
            )));
        }
        if wallet.loyalty_points < points {
            return Err(AppError::InsufficientPoints {
                requested: points,
                available: wallet.loyalty_points,
            });
        }

        let credit = settings.points_value_cents(points);
        if credit <= 0 {
            return Err(AppError::ValidationError(
                "Points have no cash value under the current settings".to_string(),
            ));
        }
        wallet.balance.checked_add(credit).ok_or_else(overflow)?;

        let description = format!("Converted {points} points to ${:.2}", credit as f64 / 100.0);
        let redeemed = self.redeem_points(customer_id, points, &description, None, now)?;
        let credited = self.add_to_wallet_balance(
            customer_id,
            credit,
            &description,
            Some(redeemed.id.clone()),
            now,
        )?;
        Ok((redeemed, credited))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{customer, settings};

    fn state_with_customer(id: &str) -> LedgerState {
        let mut state = LedgerState::default();
        state.customers.push(customer(id, &format!("{id}@example.com")));
        state.create_wallet(id, Utc::now()).unwrap();
        state
    }

    #[test]
    fn test_create_wallet_is_idempotent() {
        let mut state = state_with_customer("cus_1");
        let first = state.wallet("cus_1").unwrap().clone();
        let second = state.create_wallet("cus_1", Utc::now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(state.wallets.len(), 1);
    }

    #[test]
    fn test_create_wallet_requires_customer() {
        let mut state = LedgerState::default();
        assert!(matches!(
            state.create_wallet("cus_missing", Utc::now()),
            Err(AppError::NotFound(_))
        ));
        assert!(state.wallets.is_empty());
    }

    #[test]
    fn test_add_points_updates_totals_and_appends_one_transaction() {
        let mut state = state_with_customer("cus_1");
        state
            .add_points("cus_1", 40, "seed", None, Utc::now())
            .unwrap();
        let before = state.wallet("cus_1").unwrap().clone();
        let count = state.transactions.len();

        let tx = state
            .add_points("cus_1", 60, "Haircut", Some("bk_1".into()), Utc::now())
            .unwrap();

        let after = state.wallet("cus_1").unwrap();
        assert_eq!(after.loyalty_points, before.loyalty_points + 60);
        assert_eq!(after.total_points_earned, before.total_points_earned + 60);
        assert_eq!(state.transactions.len(), count + 1);
        assert_eq!(tx.transaction_type, TransactionType::PointsEarned);
        assert_eq!(tx.points_after - tx.points_before, 60);
        assert_eq!(tx.reference_id.as_deref(), Some("bk_1"));
        assert!(tx.is_consistent());
    }

    #[test]
    fn test_add_points_rejects_non_positive() {
        let mut state = state_with_customer("cus_1");
        assert!(matches!(
            state.add_points("cus_1", 0, "zero", None, Utc::now()),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            state.add_points("cus_1", -5, "negative", None, Utc::now()),
            Err(AppError::ValidationError(_))
        ));
        assert!(state.transactions.is_empty());
    }

    #[test]
    fn test_add_points_without_wallet_is_not_found() {
        let mut state = LedgerState::default();
        state.customers.push(customer("cus_1", "a@example.com"));
        assert!(matches!(
            state.add_points("cus_1", 10, "x", None, Utc::now()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_redeem_more_than_held_changes_nothing() {
        let mut state = state_with_customer("cus_1");
        state.add_points("cus_1", 50, "seed", None, Utc::now()).unwrap();
        let snapshot = state.clone();

        let err = state
            .redeem_points("cus_1", 51, "too many", None, Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientPoints {
                requested: 51,
                available: 50
            }
        ));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_redeem_points_records_negative_amount() {
        let mut state = state_with_customer("cus_1");
        state.add_points("cus_1", 300, "seed", None, Utc::now()).unwrap();

        let tx = state
            .redeem_points("cus_1", 120, "Free wash", None, Utc::now())
            .unwrap();

        let wallet = state.wallet("cus_1").unwrap();
        assert_eq!(tx.points_amount, -120);
        assert_eq!(wallet.loyalty_points, 180);
        assert_eq!(wallet.total_points_redeemed, 120);
        assert_eq!(wallet.total_points_earned, 300);
    }

    #[test]
    fn test_topup_and_deduct() {
        let mut state = state_with_customer("cus_1");
        let topup = state
            .add_to_wallet_balance("cus_1", 2500, "Top up", None, Utc::now())
            .unwrap();
        assert_eq!(topup.transaction_type, TransactionType::WalletTopup);
        assert_eq!((topup.balance_before, topup.balance_after), (0, 2500));

        let payment = state
            .deduct_from_wallet_balance("cus_1", 1000, "Beard trim", Some("bk_9".into()), Utc::now())
            .unwrap();
        assert_eq!(payment.amount, -1000);
        assert_eq!(payment.balance_after, 1500);
        assert!(payment.is_consistent());
    }

    #[test]
    fn test_deduct_more_than_balance_fails() {
        let mut state = state_with_customer("cus_1");
        state
            .add_to_wallet_balance("cus_1", 500, "Top up", None, Utc::now())
            .unwrap();
        let snapshot = state.clone();

        assert!(matches!(
            state.deduct_from_wallet_balance("cus_1", 501, "Color", None, Utc::now()),
            Err(AppError::InsufficientBalance {
                requested: 501,
                available: 500
            })
        ));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_topup_overflow_is_rejected() {
        let mut state = state_with_customer("cus_1");
        state
            .add_to_wallet_balance("cus_1", i64::MAX, "max", None, Utc::now())
            .unwrap();
        assert!(matches!(
            state.add_to_wallet_balance("cus_1", 1, "one more", None, Utc::now()),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_convert_points_to_wallet() {
        let mut state = state_with_customer("cus_1");
        state.loyalty_settings.push(settings(None, 100, 0.01));
        state.add_points("cus_1", 1000, "seed", None, Utc::now()).unwrap();
        let count = state.transactions.len();

        let (redeemed, credited) = state
            .convert_points_to_wallet("cus_1", 500, None, Utc::now())
            .unwrap();

        let wallet = state.wallet("cus_1").unwrap();
        assert_eq!(wallet.loyalty_points, 500);
        assert_eq!(wallet.balance, 500);
        assert_eq!(state.transactions.len(), count + 2);
        assert_eq!(redeemed.transaction_type, TransactionType::PointsRedeemed);
        assert_eq!(redeemed.points_amount, -500);
        assert_eq!(credited.transaction_type, TransactionType::WalletTopup);
        assert_eq!(credited.amount, 500);
        assert_eq!(credited.reference_id.as_deref(), Some(redeemed.id.as_str()));
    }

    #[test]
    fn test_convert_below_minimum_mutates_nothing() {
        let mut state = state_with_customer("cus_1");
        state.loyalty_settings.push(settings(None, 100, 0.01));
        state.add_points("cus_1", 1000, "seed", None, Utc::now()).unwrap();
        let snapshot = state.clone();

        assert!(matches!(
            state.convert_points_to_wallet("cus_1", 99, None, Utc::now()),
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_convert_respects_maximum_per_transaction() {
        let mut state = state_with_customer("cus_1");
        let mut s = settings(None, 100, 0.01);
        s.maximum_points_per_transaction = 400;
        state.loyalty_settings.push(s);
        state.add_points("cus_1", 1000, "seed", None, Utc::now()).unwrap();

        assert!(state
            .convert_points_to_wallet("cus_1", 500, None, Utc::now())
            .is_err());
        assert!(state
            .convert_points_to_wallet("cus_1", 400, None, Utc::now())
            .is_ok());
    }

    #[test]
    fn test_convert_without_settings_is_unavailable() {
        let mut state = state_with_customer("cus_1");
        state.add_points("cus_1", 1000, "seed", None, Utc::now()).unwrap();
        assert!(matches!(
            state.convert_points_to_wallet("cus_1", 500, None, Utc::now()),
            Err(AppError::LoyaltyUnavailable)
        ));
    }

    #[test]
    fn test_convert_insufficient_points_mutates_nothing() {
        let mut state = state_with_customer("cus_1");
        state.loyalty_settings.push(settings(None, 100, 0.01));
        state.add_points("cus_1", 200, "seed", None, Utc::now()).unwrap();
        let snapshot = state.clone();

        assert!(matches!(
            state.convert_points_to_wallet("cus_1", 300, None, Utc::now()),
            Err(AppError::InsufficientPoints { .. })
        ));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_deleted_customer_wallet_is_frozen() {
        let mut state = state_with_customer("cus_1");
        state.customers[0].deleted_at = Some(Utc::now());
        assert!(matches!(
            state.add_points("cus_1", 10, "x", None, Utc::now()),
            Err(AppError::NotFound(_))
        ));
    }
}
