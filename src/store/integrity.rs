use super::LedgerState;
use crate::models::IntegrityReport;
use std::collections::{HashMap, HashSet};

impl LedgerState {
    /// 检查引用完整性、快照一致性以及钱包与流水回放结果是否一致
    pub fn verify_integrity(&self) -> IntegrityReport {
        let customer_ids: HashSet<&str> = self.customers.iter().map(|c| c.id.as_str()).collect();

        let mut report = IntegrityReport {
            customers: self.customers.len(),
            wallets: self.wallets.len(),
            transactions: self.transactions.len(),
            ..Default::default()
        };

        let mut seen_wallets: HashSet<&str> = HashSet::new();
        for wallet in &self.wallets {
            if !customer_ids.contains(wallet.customer_id.as_str()) {
                report.orphaned_wallets.push(wallet.id.clone());
            }
            if !seen_wallets.insert(wallet.customer_id.as_str()) {
                report.duplicate_wallets.push(wallet.id.clone());
            }
            if wallet.balance < 0 || wallet.loyalty_points < 0 {
                report.negative_wallets.push(wallet.id.clone());
            }
        }

        // 回放：(余额, 积分, 上一条流水的 after 快照是否衔接)
        let mut replay: HashMap<&str, (i64, i64, bool)> = HashMap::new();
        for tx in &self.transactions {
            if !tx.is_consistent() {
                report.inconsistent_transactions.push(tx.id.clone());
            }
            if !seen_wallets.contains(tx.customer_id.as_str()) {
                report.orphaned_transactions.push(tx.id.clone());
                continue;
            }
            let entry = replay
                .entry(tx.customer_id.as_str())
                .or_insert((0, 0, true));
            if entry.0 != tx.balance_before || entry.1 != tx.points_before {
                entry.2 = false;
            }
            entry.0 = entry.0.saturating_add(tx.amount);
            entry.1 = entry.1.saturating_add(tx.points_amount);
        }

        for wallet in &self.wallets {
            let (balance, points, chained) = replay
                .get(wallet.customer_id.as_str())
                .copied()
                .unwrap_or((0, 0, true));
            if !chained || balance != wallet.balance || points != wallet.loyalty_points {
                report.drifted_wallets.push(wallet.id.clone());
            }
        }

        report
    }
}
