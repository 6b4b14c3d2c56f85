use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub loyalty: LoyaltyDefaults,
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("data"),
        }
    }
}

/// 首次启动且没有任何积分配置时写入的全局默认配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyDefaults {
    pub seed_default: bool,
    pub points_per_dollar_spent: f64,
    pub points_value_in_dollars: f64,
    pub minimum_points_to_redeem: i64,
    pub maximum_points_per_transaction: i64,
    pub bonus_points_first_booking: i64,
    pub bonus_points_on_birthday: i64,
    pub points_expiry_days: i64,
}

impl Default for LoyaltyDefaults {
    fn default() -> Self {
        Self {
            seed_default: true,
            points_per_dollar_spent: 1.0,
            points_value_in_dollars: 0.01,
            minimum_points_to_redeem: 100,
            maximum_points_per_transaction: 0,
            bonus_points_first_booking: 0,
            bonus_points_on_birthday: 0,
            points_expiry_days: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    pub enabled: bool,
    pub birthday_interval_secs: u64,
    pub expiry_interval_secs: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            birthday_interval_secs: 3600,
            expiry_interval_secs: 6 * 3600,
        }
    }
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 配置文件不存在时完全依赖环境变量与默认值
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)
                .with_context(|| format!("failed to parse config file {config_path}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read config file {config_path}"));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(config_str)?)
    }

    pub fn apply_env<F>(&mut self, get_env: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: FromStr>(name: &str, v: String) -> anyhow::Result<T>
        where
            T::Err: std::fmt::Display,
        {
            v.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid value for {name}: {e}"))
        }

        if let Some(v) = get_env("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get_env("SERVER_PORT") {
            self.server.port = parse("SERVER_PORT", v)?;
        }
        if let Some(v) = get_env("STORAGE_BACKEND") {
            self.storage.backend = v.parse()?;
        }
        if let Some(v) = get_env("STORAGE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }

        // 积分默认配置
        if let Some(v) = get_env("LOYALTY_SEED_DEFAULT") {
            self.loyalty.seed_default = parse("LOYALTY_SEED_DEFAULT", v)?;
        }
        if let Some(v) = get_env("LOYALTY_POINTS_PER_DOLLAR") {
            self.loyalty.points_per_dollar_spent = parse("LOYALTY_POINTS_PER_DOLLAR", v)?;
        }
        if let Some(v) = get_env("LOYALTY_POINT_VALUE") {
            self.loyalty.points_value_in_dollars = parse("LOYALTY_POINT_VALUE", v)?;
        }
        if let Some(v) = get_env("LOYALTY_MIN_REDEEM") {
            self.loyalty.minimum_points_to_redeem = parse("LOYALTY_MIN_REDEEM", v)?;
        }
        if let Some(v) = get_env("LOYALTY_MAX_PER_TRANSACTION") {
            self.loyalty.maximum_points_per_transaction =
                parse("LOYALTY_MAX_PER_TRANSACTION", v)?;
        }
        if let Some(v) = get_env("LOYALTY_FIRST_BOOKING_BONUS") {
            self.loyalty.bonus_points_first_booking = parse("LOYALTY_FIRST_BOOKING_BONUS", v)?;
        }
        if let Some(v) = get_env("LOYALTY_BIRTHDAY_BONUS") {
            self.loyalty.bonus_points_on_birthday = parse("LOYALTY_BIRTHDAY_BONUS", v)?;
        }
        if let Some(v) = get_env("LOYALTY_EXPIRY_DAYS") {
            self.loyalty.points_expiry_days = parse("LOYALTY_EXPIRY_DAYS", v)?;
        }

        // 定时任务
        if let Some(v) = get_env("TASKS_ENABLED") {
            self.tasks.enabled = parse("TASKS_ENABLED", v)?;
        }
        if let Some(v) = get_env("TASKS_BIRTHDAY_INTERVAL_SECS") {
            self.tasks.birthday_interval_secs = parse("TASKS_BIRTHDAY_INTERVAL_SECS", v)?;
        }
        if let Some(v) = get_env("TASKS_EXPIRY_INTERVAL_SECS") {
            self.tasks.expiry_interval_secs = parse("TASKS_EXPIRY_INTERVAL_SECS", v)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let l = &self.loyalty;
        if !l.points_per_dollar_spent.is_finite() || l.points_per_dollar_spent < 0.0 {
            bail!("loyalty.points_per_dollar_spent must be a non-negative number");
        }
        if !l.points_value_in_dollars.is_finite() || l.points_value_in_dollars < 0.0 {
            bail!("loyalty.points_value_in_dollars must be a non-negative number");
        }
        if l.points_expiry_days < 0
            || l.points_expiry_days > crate::services::MAX_POINTS_EXPIRY_DAYS
        {
            bail!(
                "loyalty.points_expiry_days must be between 0 and {}",
                crate::services::MAX_POINTS_EXPIRY_DAYS
            );
        }
        if self.tasks.birthday_interval_secs == 0 || self.tasks.expiry_interval_secs == 0 {
            bail!("task intervals must be greater than zero");
        }
        Ok(())
    }
}
