use crate::error::AppResult;
use crate::models::*;
use crate::store::Store;
use chrono::Utc;

#[derive(Clone)]
pub struct WalletService {
    store: Store,
}

impl WalletService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// 幂等创建钱包
    pub async fn create_wallet(&self, customer_id: &str) -> AppResult<Wallet> {
        let customer_id = customer_id.to_string();
        self.store
            .transact(move |state| state.create_wallet(&customer_id, Utc::now()))
            .await
    }

    pub async fn get_wallet(&self, customer_id: &str) -> AppResult<Wallet> {
        self.store
            .read(|state| state.require_wallet(customer_id).cloned())
            .await
    }

    pub async fn add_points(
        &self,
        customer_id: &str,
        points: i64,
        description: &str,
        reference_id: Option<String>,
    ) -> AppResult<Transaction> {
        let tx = self
            .store
            .transact(|state| {
                state.add_points(customer_id, points, description, reference_id, Utc::now())
            })
            .await?;
        log::info!(
            "Customer {customer_id} earned {points} points ({} -> {})",
            tx.points_before,
            tx.points_after
        );
        Ok(tx)
    }

    pub async fn redeem_points(
        &self,
        customer_id: &str,
        points: i64,
        description: &str,
        reference_id: Option<String>,
    ) -> AppResult<Transaction> {
        let tx = self
            .store
            .transact(|state| {
                state.redeem_points(customer_id, points, description, reference_id, Utc::now())
            })
            .await?;
        log::info!(
            "Customer {customer_id} redeemed {points} points ({} -> {})",
            tx.points_before,
            tx.points_after
        );
        Ok(tx)
    }

    pub async fn add_to_wallet_balance(
        &self,
        customer_id: &str,
        amount: i64,
        description: &str,
        reference_id: Option<String>,
    ) -> AppResult<Transaction> {
        let tx = self
            .store
            .transact(|state| {
                state.add_to_wallet_balance(customer_id, amount, description, reference_id, Utc::now())
            })
            .await?;
        log::info!(
            "Wallet top-up for customer {customer_id}: {amount} cents (balance {})",
            tx.balance_after
        );
        Ok(tx)
    }

    pub async fn deduct_from_wallet_balance(
        &self,
        customer_id: &str,
        amount: i64,
        description: &str,
        reference_id: Option<String>,
    ) -> AppResult<Transaction> {
        let tx = self
            .store
            .transact(|state| {
                state.deduct_from_wallet_balance(
                    customer_id,
                    amount,
                    description,
                    reference_id,
                    Utc::now(),
                )
            })
            .await?;
        log::info!(
            "Wallet payment for customer {customer_id}: {amount} cents (balance {})",
            tx.balance_after
        );
        Ok(tx)
    }

    pub async fn refund_to_wallet(
        &self,
        customer_id: &str,
        amount: i64,
        description: &str,
        reference_id: Option<String>,
    ) -> AppResult<Transaction> {
        let tx = self
            .store
            .transact(|state| {
                state.refund_to_wallet(customer_id, amount, description, reference_id, Utc::now())
            })
            .await?;
        log::info!(
            "Refunded {amount} cents to wallet of customer {customer_id} (balance {})",
            tx.balance_after
        );
        Ok(tx)
    }

    /// 积分兑换余额，扣积分与加余额在同一次状态变更中完成
    pub async fn convert_points_to_wallet(
        &self,
        customer_id: &str,
        points: i64,
        branch_id: Option<&str>,
    ) -> AppResult<ConversionResponse> {
        let response = self
            .store
            .transact(|state| {
                let (redeemed, credited) =
                    state.convert_points_to_wallet(customer_id, points, branch_id, Utc::now())?;
                let wallet = state.require_wallet(customer_id)?.clone();
                Ok(ConversionResponse {
                    redeemed,
                    credited,
                    wallet,
                })
            })
            .await?;
        log::info!(
            "Customer {customer_id} converted {points} points into {} cents",
            response.credited.amount
        );
        Ok(response)
    }

    /// 流水按时间倒序分页
    pub async fn list_transactions(
        &self,
        customer_id: &str,
        query: &TransactionQuery,
    ) -> AppResult<PaginatedResponse<Transaction>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let transactions = self
            .store
            .read(|state| {
                state.require_wallet(customer_id)?;
                Ok::<_, crate::error::AppError>(
                    state
                        .transactions_for(customer_id)
                        .filter(|t| {
                            query
                                .transaction_type
                                .is_none_or(|kind| t.transaction_type == kind)
                        })
                        .rev()
                        .cloned()
                        .collect::<Vec<_>>(),
                )
            })
            .await?;

        Ok(PaginatedResponse::paginate(transactions, &params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::{CustomerService, LoyaltySettingsService};

    async fn setup() -> (Store, WalletService, String) {
        let store = Store::in_memory();
        LoyaltySettingsService::new(store.clone())
            .create_settings(CreateLoyaltySettingsRequest {
                points_per_dollar_spent: 1.0,
                points_value_in_dollars: 0.01,
                minimum_points_to_redeem: 100,
                maximum_points_per_transaction: 0,
                bonus_points_first_booking: 0,
                bonus_points_on_birthday: 0,
                points_expiry_days: 0,
                is_active: true,
                branch_id: None,
            })
            .await
            .unwrap();
        let customer = CustomerService::new(store.clone())
            .register_customer(RegisterCustomerRequest {
                email: "sam@example.com".to_string(),
                name: "Sam".to_string(),
                phone: None,
                birthday: None,
                preferred_branch_id: None,
                notes: None,
            })
            .await
            .unwrap()
            .customer;
        (store.clone(), WalletService::new(store), customer.id)
    }

    #[tokio::test]
    async fn test_create_wallet_twice_returns_same_wallet() {
        let (store, service, customer_id) = setup().await;
        let first = service.create_wallet(&customer_id).await.unwrap();
        let second = service.create_wallet(&customer_id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.read(|s| s.wallets.len()).await, 1);
    }

    #[tokio::test]
    async fn test_convert_500_points_credits_five_dollars() {
        let (store, service, customer_id) = setup().await;
        service
            .add_points(&customer_id, 1000, "Loyalty", None)
            .await
            .unwrap();
        let before = store.read(|s| s.transactions.len()).await;

        let response = service
            .convert_points_to_wallet(&customer_id, 500, None)
            .await
            .unwrap();

        assert_eq!(response.wallet.loyalty_points, 500);
        assert_eq!(response.wallet.balance, 500);
        assert_eq!(response.credited.amount, 500);
        assert_eq!(store.read(|s| s.transactions.len()).await, before + 2);
    }

    #[tokio::test]
    async fn test_failed_redeem_leaves_wallet_unchanged() {
        let (_, service, customer_id) = setup().await;
        service.add_points(&customer_id, 10, "seed", None).await.unwrap();
        let before = service.get_wallet(&customer_id).await.unwrap();

        let err = service
            .redeem_points(&customer_id, 11, "too many", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientPoints { .. }));
        assert_eq!(service.get_wallet(&customer_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let (_, service, _) = setup().await;
        assert!(matches!(
            service.add_points("cus_nope", 10, "x", None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get_wallet("cus_nope").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_transactions_newest_first_with_filter() {
        let (_, service, customer_id) = setup().await;
        service
            .add_to_wallet_balance(&customer_id, 2000, "Top up", None)
            .await
            .unwrap();
        service.add_points(&customer_id, 150, "Visit", None).await.unwrap();
        service
            .deduct_from_wallet_balance(&customer_id, 700, "Shave", Some("bk_2".into()))
            .await
            .unwrap();
        service
            .refund_to_wallet(&customer_id, 700, "Shave cancelled", Some("bk_2".into()))
            .await
            .unwrap();

        let all = service
            .list_transactions(&customer_id, &TransactionQuery::default())
            .await
            .unwrap();
        let kinds: Vec<_> = all.items.iter().map(|t| t.transaction_type).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionType::Refund,
                TransactionType::WalletPayment,
                TransactionType::PointsEarned,
                TransactionType::WalletTopup,
            ]
        );

        let payments = service
            .list_transactions(
                &customer_id,
                &TransactionQuery {
                    transaction_type: Some(TransactionType::WalletPayment),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(payments.pagination.total, 1);
        assert_eq!(payments.items[0].amount, -700);

        let wallet = service.get_wallet(&customer_id).await.unwrap();
        assert_eq!(wallet.balance, 2000);
    }
}
