use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::error::AppError;
use crate::models::*;
use crate::services::LoyaltySettingsService;

#[utoipa::path(
    get,
    path = "/loyalty-settings",
    tag = "loyalty",
    responses(
        (status = 200, description = "获取积分配置列表成功", body = [LoyaltySettings])
    )
)]
pub async fn list_settings(
    loyalty_service: web::Data<LoyaltySettingsService>,
) -> Result<HttpResponse> {
    let settings = loyalty_service.list_settings().await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": settings
    })))
}

#[utoipa::path(
    post,
    path = "/loyalty-settings",
    tag = "loyalty",
    request_body = CreateLoyaltySettingsRequest,
    responses(
        (status = 201, description = "创建积分配置成功", body = LoyaltySettings),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_settings(
    loyalty_service: web::Data<LoyaltySettingsService>,
    request: web::Json<CreateLoyaltySettingsRequest>,
) -> Result<HttpResponse> {
    match loyalty_service.create_settings(request.into_inner()).await {
        Ok(settings) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": settings
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/loyalty-settings/active",
    tag = "loyalty",
    params(("branch_id" = Option<String>, Query, description = "门店ID，缺省为全局配置")),
    responses(
        (status = 200, description = "获取生效配置成功", body = LoyaltySettings),
        (status = 422, description = "积分计划不可用")
    )
)]
pub async fn get_active_settings(
    loyalty_service: web::Data<LoyaltySettingsService>,
    query: web::Query<BranchQuery>,
) -> Result<HttpResponse> {
    match loyalty_service
        .get_active_loyalty_settings(query.branch_id.as_deref())
        .await
    {
        Some(settings) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": settings
        }))),
        None => Ok(AppError::LoyaltyUnavailable.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/loyalty-settings/calculate",
    tag = "loyalty",
    params(
        ("amount" = Option<i64>, Query, description = "消费金额(美分)"),
        ("points" = Option<i64>, Query, description = "积分数量"),
        ("branch_id" = Option<String>, Query, description = "门店ID")
    ),
    responses(
        (status = 200, description = "计算成功", body = CalculationResponse)
    )
)]
pub async fn calculate(
    loyalty_service: web::Data<LoyaltySettingsService>,
    query: web::Query<CalculateQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let branch_id = query.branch_id.as_deref();
    let response = CalculationResponse {
        points_for_amount: loyalty_service
            .calculate_points_for_amount(query.amount.unwrap_or(0), branch_id)
            .await,
        points_value: loyalty_service
            .calculate_points_value(query.points.unwrap_or(0), branch_id)
            .await,
    };
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": response
    })))
}

#[utoipa::path(
    get,
    path = "/loyalty-settings/{id}",
    tag = "loyalty",
    params(("id" = String, Path, description = "配置ID")),
    responses(
        (status = 200, description = "获取积分配置成功", body = LoyaltySettings),
        (status = 404, description = "配置不存在")
    )
)]
pub async fn get_settings(
    loyalty_service: web::Data<LoyaltySettingsService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match loyalty_service.get_settings(&path.into_inner()).await {
        Ok(settings) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": settings
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/loyalty-settings/{id}",
    tag = "loyalty",
    params(("id" = String, Path, description = "配置ID")),
    request_body = UpdateLoyaltySettingsRequest,
    responses(
        (status = 200, description = "更新积分配置成功", body = LoyaltySettings),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "配置不存在")
    )
)]
pub async fn update_settings(
    loyalty_service: web::Data<LoyaltySettingsService>,
    path: web::Path<String>,
    request: web::Json<UpdateLoyaltySettingsRequest>,
) -> Result<HttpResponse> {
    match loyalty_service
        .update_settings(&path.into_inner(), request.into_inner())
        .await
    {
        Ok(settings) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": settings
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/loyalty-settings/{id}",
    tag = "loyalty",
    params(("id" = String, Path, description = "配置ID")),
    responses(
        (status = 200, description = "删除积分配置成功"),
        (status = 404, description = "配置不存在")
    )
)]
pub async fn delete_settings(
    loyalty_service: web::Data<LoyaltySettingsService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match loyalty_service.delete_settings(&id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "id": id, "deleted": true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn loyalty_settings_config(cfg: &mut web::ServiceConfig) {
    // 固定路径需在 /{id} 之前注册
    cfg.service(
        web::scope("/loyalty-settings")
            .route("", web::get().to(list_settings))
            .route("", web::post().to(create_settings))
            .route("/active", web::get().to(get_active_settings))
            .route("/calculate", web::get().to(calculate))
            .route("/{id}", web::get().to(get_settings))
            .route("/{id}", web::put().to(update_settings))
            .route("/{id}", web::delete().to(delete_settings)),
    );
}
