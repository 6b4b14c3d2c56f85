use uuid::Uuid;

pub const CUSTOMER_PREFIX: &str = "cus";
pub const WALLET_PREFIX: &str = "wal";
pub const TRANSACTION_PREFIX: &str = "txn";
pub const LOYALTY_SETTINGS_PREFIX: &str = "lys";

/// 生成带类型前缀的唯一ID，例如 `cus_5f0c…`
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_has_prefix() {
        let id = generate_id(CUSTOMER_PREFIX);
        assert!(id.starts_with("cus_"));
        assert_eq!(id.len(), 4 + 32);
    }

    #[test]
    fn test_generate_id_is_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id(TRANSACTION_PREFIX)).collect();
        assert_eq!(ids.len(), 1000);
    }
}
