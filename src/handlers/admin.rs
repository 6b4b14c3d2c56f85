use actix_web::{web, HttpResponse, Result, ResponseError};
use chrono::Utc;
use serde_json::json;
use crate::models::*;
use crate::services::{BirthdayRewardService, PointsExpiryService};
use crate::store::Store;

#[utoipa::path(
    get,
    path = "/admin/integrity",
    tag = "admin",
    responses(
        (status = 200, description = "账本一致性检查结果", body = IntegrityReport)
    )
)]
pub async fn check_integrity(store: web::Data<Store>) -> Result<HttpResponse> {
    let report = store.read(|state| state.verify_integrity()).await;
    if !report.is_clean() {
        log::warn!("Ledger integrity check found problems: {report:?}");
    }
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": report
    })))
}

#[utoipa::path(
    post,
    path = "/admin/birthday-rewards",
    tag = "admin",
    request_body = BirthdayRunRequest,
    responses(
        (status = 200, description = "生日积分发放完成", body = BirthdayRunResponse),
        (status = 500, description = "发放失败")
    )
)]
pub async fn run_birthday_rewards(
    birthday_service: web::Data<BirthdayRewardService>,
    request: Option<web::Json<BirthdayRunRequest>>,
) -> Result<HttpResponse> {
    let date = request
        .and_then(|r| r.into_inner().date)
        .unwrap_or_else(|| Utc::now().date_naive());

    match birthday_service.grant_birthday_rewards(date).await {
        Ok(granted) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": BirthdayRunResponse { date, granted }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/expire-points",
    tag = "admin",
    responses(
        (status = 200, description = "积分过期处理完成", body = ExpiryRunResponse),
        (status = 500, description = "处理失败")
    )
)]
pub async fn run_points_expiry(
    expiry_service: web::Data<PointsExpiryService>,
) -> Result<HttpResponse> {
    match expiry_service.expire_points(Utc::now()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/integrity", web::get().to(check_integrity))
            .route("/birthday-rewards", web::post().to(run_birthday_rewards))
            .route("/expire-points", web::post().to(run_points_expiry)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_integrity_of_empty_ledger_is_clean() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Store::in_memory()))
                .configure(admin_config),
        )
        .await;

        let req = test::TestRequest::get().uri("/admin/integrity").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["transactions"], 0);
        assert_eq!(body["data"]["drifted_wallets"].as_array().map(Vec::len), Some(0));
    }

    #[actix_web::test]
    async fn test_birthday_run_without_body_uses_today() {
        let store = Store::in_memory();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(BirthdayRewardService::new(store)))
                .configure(admin_config),
        )
        .await;

        let req = test::TestRequest::post().uri("/admin/birthday-rewards").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["granted"], 0);
        assert_eq!(
            body["data"]["date"],
            Utc::now().date_naive().format("%Y-%m-%d").to_string()
        );
    }
}
