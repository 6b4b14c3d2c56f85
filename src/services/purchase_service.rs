use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::store::{LedgerState, PointsDelta, Posting, Store};
use chrono::Utc;

/// 预约/订单完成后的入账：积分按当前积分配置重新计算，不信任调用方传入的积分
#[derive(Clone)]
pub struct PurchaseService {
    store: Store,
}

struct Breakdown {
    points_redeemed: i64,
    points_discount: i64,
    wallet_paid: i64,
    cash_due: i64,
    points_earned: i64,
}

fn compute_breakdown(state: &LedgerState, request: &CompletePurchaseRequest) -> AppResult<Breakdown> {
    let wallet = state.require_wallet(&request.customer_id)?;
    let settings = state.active_settings(request.branch_id.as_deref());

    // 积分抵扣
    let points_redeemed = request.points_to_redeem.unwrap_or(0);
    let points_discount = if points_redeemed > 0 {
        let settings = settings.ok_or(AppError::LoyaltyUnavailable)?;
        if points_redeemed < settings.minimum_points_to_redeem {
            return Err(AppError::ValidationError(format!(
                "Minimum {} points required to redeem",
                settings.minimum_points_to_redeem
            )));
        }
        if settings.maximum_points_per_transaction > 0
            && points_redeemed > settings.maximum_points_per_transaction
        {
            return Err(AppError::ValidationError(format!(
                "At most {} points can be redeemed per transaction",
                settings.maximum_points_per_transaction
            )));
        }
        if wallet.loyalty_points < points_redeemed {
            return Err(AppError::InsufficientPoints {
                requested: points_redeemed,
                available: wallet.loyalty_points,
            });
        }
        let discount = settings.points_value_cents(points_redeemed);
        if discount > request.total_amount {
            return Err(AppError::ValidationError(
                "Points discount exceeds the purchase total".to_string(),
            ));
        }
        discount
    } else {
        0
    };

    let payable = request.total_amount - points_discount;
    let wallet_paid = match request.payment_method {
        PaymentMethod::Cash => 0,
        PaymentMethod::Wallet => payable,
        PaymentMethod::Mixed => {
            let amount = request.wallet_amount.ok_or_else(|| {
                AppError::ValidationError("wallet_amount is required for mixed payment".to_string())
            })?;
            if amount <= 0 || amount >= payable {
                return Err(AppError::ValidationError(
                    "wallet_amount must be between zero and the amount payable".to_string(),
                ));
            }
            amount
        }
    };
    if wallet.balance < wallet_paid {
        return Err(AppError::InsufficientBalance {
            requested: wallet_paid,
            available: wallet.balance,
        });
    }

    let points_earned = settings.map(|s| s.points_for_amount(payable)).unwrap_or(0);

    Ok(Breakdown {
        points_redeemed,
        points_discount,
        wallet_paid,
        cash_due: payable - wallet_paid,
        points_earned,
    })
}

impl PurchaseService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn complete_purchase(
        &self,
        request: CompletePurchaseRequest,
    ) -> AppResult<PurchaseReceipt> {
        // 验证输入
        if request.reference_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "reference_id is required".to_string(),
            ));
        }
        if request.total_amount < 0 {
            return Err(AppError::ValidationError(
                "total_amount must not be negative".to_string(),
            ));
        }
        if request.points_to_redeem.is_some_and(|p| p < 0) {
            return Err(AppError::ValidationError(
                "points_to_redeem must not be negative".to_string(),
            ));
        }

        let receipt = self
            .store
            .transact(|state| {
                // 检查是否已经处理过
                if let Some(existing) =
                    state.purchase(&request.customer_id, request.kind, &request.reference_id)
                {
                    let transaction = state
                        .transaction(&existing.transaction_id)
                        .cloned()
                        .ok_or_else(|| {
                            AppError::InternalError(format!(
                                "Missing transaction {} for purchase {}",
                                existing.transaction_id, existing.reference_id
                            ))
                        })?;
                    return Ok(PurchaseReceipt {
                        purchase: existing.clone(),
                        transaction,
                        wallet: state.require_wallet(&request.customer_id)?.clone(),
                        already_processed: true,
                    });
                }

                let breakdown = compute_breakdown(state, &request)?;
                let now = Utc::now();
                let transaction = state.post(
                    Posting {
                        customer_id: request.customer_id.clone(),
                        transaction_type: request.kind.transaction_type(),
                        amount: -breakdown.wallet_paid,
                        points: PointsDelta {
                            earned: breakdown.points_earned,
                            redeemed: breakdown.points_redeemed,
                            expired: 0,
                        },
                        description: format!(
                            "Completed {} {} (${:.2})",
                            request.kind,
                            request.reference_id,
                            request.total_amount as f64 / 100.0
                        ),
                        reference_id: Some(request.reference_id.clone()),
                    },
                    now,
                )?;

                let purchase = PurchaseRecord {
                    customer_id: request.customer_id.clone(),
                    kind: request.kind,
                    reference_id: request.reference_id.clone(),
                    transaction_id: transaction.id.clone(),
                    total_amount: request.total_amount,
                    points_earned: breakdown.points_earned,
                    points_redeemed: breakdown.points_redeemed,
                    points_discount: breakdown.points_discount,
                    wallet_paid: breakdown.wallet_paid,
                    cash_due: breakdown.cash_due,
                    payment_method: request.payment_method,
                    created_at: now,
                    refund_transaction_id: None,
                };
                state.purchases.push(purchase.clone());

                Ok(PurchaseReceipt {
                    purchase,
                    transaction,
                    wallet: state.require_wallet(&request.customer_id)?.clone(),
                    already_processed: false,
                })
            })
            .await?;

        if receipt.already_processed {
            log::info!(
                "Purchase already processed for reference_id: {}",
                request.reference_id
            );
        } else {
            log::info!(
                "Recorded {} {} for customer {}: wallet {} cents, points +{} -{}",
                request.kind,
                request.reference_id,
                request.customer_id,
                receipt.purchase.wallet_paid,
                receipt.purchase.points_earned,
                receipt.purchase.points_redeemed
            );
        }
        Ok(receipt)
    }

    /// 退款：退回钱包支付部分，冲回获得的积分(最多冲回当前持有的积分)，退还抵扣的积分
    pub async fn refund_purchase(&self, request: RefundPurchaseRequest) -> AppResult<RefundReceipt> {
        let receipt = self
            .store
            .transact(|state| {
                let purchase = state
                    .purchase(&request.customer_id, request.kind, &request.reference_id)
                    .cloned()
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Purchase not found: {}", request.reference_id))
                    })?;
                if purchase.is_refunded() {
                    return Err(AppError::Conflict(format!(
                        "Purchase {} already refunded",
                        purchase.reference_id
                    )));
                }

                // 先退还抵扣的积分，再冲回获得的积分，冲回量不超过届时持有的积分
                let held = state.require_wallet(&request.customer_id)?.loyalty_points;
                let points_restored = purchase.points_redeemed;
                let points_reversed = purchase
                    .points_earned
                    .min(held.saturating_add(points_restored));

                let transaction = state.post(
                    Posting {
                        customer_id: request.customer_id.clone(),
                        transaction_type: TransactionType::Refund,
                        amount: purchase.wallet_paid,
                        points: PointsDelta {
                            earned: -points_reversed,
                            redeemed: -points_restored,
                            expired: 0,
                        },
                        description: format!("Refund of {} {}", purchase.kind, purchase.reference_id),
                        reference_id: Some(purchase.reference_id.clone()),
                    },
                    Utc::now(),
                )?;

                let record = state
                    .purchases
                    .iter_mut()
                    .find(|p| {
                        p.customer_id == purchase.customer_id
                            && p.kind == purchase.kind
                            && p.reference_id == purchase.reference_id
                    })
                    .ok_or_else(|| AppError::InternalError("purchase vanished".to_string()))?;
                record.refund_transaction_id = Some(transaction.id.clone());
                let purchase = record.clone();

                Ok(RefundReceipt {
                    wallet_refunded: purchase.wallet_paid,
                    purchase,
                    transaction,
                    wallet: state.require_wallet(&request.customer_id)?.clone(),
                    points_reversed,
                    points_restored,
                })
            })
            .await?;

        log::info!(
            "Refunded {} {} for customer {}",
            request.kind,
            request.reference_id,
            request.customer_id
        );
        Ok(receipt)
    }
}
