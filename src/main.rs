use actix_web::{App, HttpServer, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines

use salon_ledger::{
    config::Config,
    handlers,
    middlewares::create_cors,
    services::*,
    storage::create_storage,
    store::Store,
    swagger::swagger_config,
    tasks,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().map_err(std::io::Error::other)?;

    // 打开存储并恢复账本快照
    let storage = create_storage(&config.storage).map_err(std::io::Error::other)?;
    let store = Store::open(storage).map_err(std::io::Error::other)?;

    // 创建服务
    let customer_service = CustomerService::new(store.clone());
    let wallet_service = WalletService::new(store.clone());
    let loyalty_settings_service = LoyaltySettingsService::new(store.clone());
    let purchase_service = PurchaseService::new(store.clone());
    let birthday_reward_service = BirthdayRewardService::new(store.clone());
    let points_expiry_service = PointsExpiryService::new(store.clone());

    // 首次启动时写入默认积分配置
    match loyalty_settings_service.seed_default(&config.loyalty).await {
        Ok(Some(settings)) => log::info!("Seeded default loyalty settings {}", settings.id),
        Ok(None) => {}
        Err(e) => log::error!("Failed to seed default loyalty settings: {e:?}"),
    }

    if config.tasks.enabled {
        tasks::spawn_all(
            birthday_reward_service.clone(),
            points_expiry_service.clone(),
            &config.tasks,
        );
    }

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(customer_service.clone()))
            .app_data(web::Data::new(wallet_service.clone()))
            .app_data(web::Data::new(loyalty_settings_service.clone()))
            .app_data(web::Data::new(purchase_service.clone()))
            .app_data(web::Data::new(birthday_reward_service.clone()))
            .app_data(web::Data::new(points_expiry_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::customer_config)
                    .configure(handlers::wallet_config)
                    .configure(handlers::loyalty_settings_config)
                    .configure(handlers::purchase_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
