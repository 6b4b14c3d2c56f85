//! In-process ledger store.
//!
//! `Store` owns the single [`LedgerState`] and is the transaction boundary for
//! every use case: a closure runs against a draft copy, the draft is persisted,
//! and only then does it replace the published state. A failing closure or a
//! failing write leaves both the published state and the snapshot untouched.

mod integrity;
mod ledger;
mod state;

pub use ledger::{PointsDelta, Posting};
pub use state::{BirthdayGrant, LedgerState};

use crate::error::{AppError, AppResult};
use crate::storage::{CUSTOMER_STORAGE_KEY, MemoryStorage, Storage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    state: &'a LedgerState,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    state: LedgerState,
}

pub fn encode_snapshot(state: &LedgerState) -> AppResult<String> {
    Ok(serde_json::to_string(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        state,
    })?)
}

pub fn decode_snapshot(contents: &str) -> AppResult<LedgerState> {
    let snapshot: Snapshot = serde_json::from_str(contents)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(AppError::InternalError(format!(
            "Unsupported snapshot version {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }
    Ok(snapshot.state)
}

#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<LedgerState>>,
    storage: Arc<dyn Storage>,
}

impl Store {
    /// 从存储中恢复快照；没有快照时从空账本开始
    pub fn open(storage: Arc<dyn Storage>) -> AppResult<Self> {
        let state = match storage.load(CUSTOMER_STORAGE_KEY)? {
            Some(contents) => {
                let state = decode_snapshot(&contents)?;
                log::info!(
                    "Rehydrated ledger: {} customers, {} wallets, {} transactions",
                    state.customers.len(),
                    state.wallets.len(),
                    state.transactions.len()
                );
                let report = state.verify_integrity();
                if !report.is_clean() {
                    log::warn!("Ledger integrity issues after rehydration: {report:?}");
                }
                state
            }
            None => {
                log::info!("No ledger snapshot found, starting empty");
                LedgerState::default()
            }
        };

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            storage,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    pub async fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&LedgerState) -> T,
    {
        let guard = self.state.lock().await;
        f(&guard)
    }

    pub async fn transact<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut LedgerState) -> AppResult<T>,
    {
        let mut guard = self.state.lock().await;
        let mut draft = guard.clone();
        let out = f(&mut draft)?;

        // 状态没有变化时不必重写快照
        if draft != *guard {
            let snapshot = encode_snapshot(&draft)?;
            let storage = Arc::clone(&self.storage);
            // 文件写入与 fsync 放到阻塞线程池，不占用运行时工作线程
            tokio::task::spawn_blocking(move || storage.save(CUSTOMER_STORAGE_KEY, &snapshot))
                .await
                .map_err(|e| AppError::InternalError(format!("Snapshot write task failed: {e}")))??;
            *guard = draft;
        }
        Ok(out)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{Customer, LoyaltySettings};
    use chrono::Utc;

    pub fn customer(id: &str, email: &str) -> Customer {
        let now = Utc::now();
        Customer {
            id: id.to_string(),
            email: email.to_string(),
            name: format!("Customer {id}"),
            phone: None,
            birthday: None,
            preferred_branch_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn settings(branch_id: Option<&str>, minimum: i64, value: f64) -> LoyaltySettings {
        let now = Utc::now();
        LoyaltySettings {
            id: format!("lys_{}", branch_id.unwrap_or("global")),
            points_per_dollar_spent: 1.0,
            points_value_in_dollars: value,
            minimum_points_to_redeem: minimum,
            maximum_points_per_transaction: 0,
            bonus_points_first_booking: 0,
            bonus_points_on_birthday: 0,
            points_expiry_days: 0,
            is_active: true,
            branch_id: branch_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }
}
