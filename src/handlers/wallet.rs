use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::WalletService;

fn description_or(description: Option<String>, fallback: &str) -> String {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[utoipa::path(
    post,
    path = "/customers/{id}/wallet",
    tag = "wallet",
    params(("id" = String, Path, description = "顾客ID")),
    responses(
        (status = 200, description = "钱包已存在或创建成功", body = Wallet),
        (status = 404, description = "顾客不存在")
    )
)]
pub async fn create_wallet(
    wallet_service: web::Data<WalletService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match wallet_service.create_wallet(&path.into_inner()).await {
        Ok(wallet) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": wallet
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customers/{id}/wallet",
    tag = "wallet",
    params(("id" = String, Path, description = "顾客ID")),
    responses(
        (status = 200, description = "获取钱包成功", body = Wallet),
        (status = 404, description = "钱包不存在")
    )
)]
pub async fn get_wallet(
    wallet_service: web::Data<WalletService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match wallet_service.get_wallet(&path.into_inner()).await {
        Ok(wallet) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": wallet
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customers/{id}/wallet/transactions",
    tag = "wallet",
    params(
        ("id" = String, Path, description = "顾客ID"),
        ("transaction_type" = Option<TransactionType>, Query, description = "流水类型"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    responses(
        (status = 200, description = "获取流水成功"),
        (status = 404, description = "钱包不存在")
    )
)]
pub async fn list_transactions(
    wallet_service: web::Data<WalletService>,
    path: web::Path<String>,
    query: web::Query<TransactionQuery>,
) -> Result<HttpResponse> {
    match wallet_service
        .list_transactions(&path.into_inner(), &query.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/{id}/wallet/points/add",
    tag = "wallet",
    params(("id" = String, Path, description = "顾客ID")),
    request_body = PointsRequest,
    responses(
        (status = 200, description = "积分增加成功", body = Transaction),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "钱包不存在")
    )
)]
pub async fn add_points(
    wallet_service: web::Data<WalletService>,
    path: web::Path<String>,
    request: web::Json<PointsRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let description = description_or(request.description, "Points added");
    match wallet_service
        .add_points(&path.into_inner(), request.points, &description, request.reference_id)
        .await
    {
        Ok(tx) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": tx
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/{id}/wallet/points/redeem",
    tag = "wallet",
    params(("id" = String, Path, description = "顾客ID")),
    request_body = PointsRequest,
    responses(
        (status = 200, description = "积分扣除成功", body = Transaction),
        (status = 404, description = "钱包不存在"),
        (status = 422, description = "积分不足")
    )
)]
pub async fn redeem_points(
    wallet_service: web::Data<WalletService>,
    path: web::Path<String>,
    request: web::Json<PointsRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let description = description_or(request.description, "Points redeemed");
    match wallet_service
        .redeem_points(&path.into_inner(), request.points, &description, request.reference_id)
        .await
    {
        Ok(tx) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": tx
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/{id}/wallet/points/convert",
    tag = "wallet",
    params(("id" = String, Path, description = "顾客ID")),
    request_body = ConvertPointsRequest,
    responses(
        (status = 200, description = "积分兑换余额成功", body = ConversionResponse),
        (status = 400, description = "低于最低兑换积分或超过单笔上限"),
        (status = 422, description = "积分不足或积分计划不可用")
    )
)]
pub async fn convert_points(
    wallet_service: web::Data<WalletService>,
    path: web::Path<String>,
    request: web::Json<ConvertPointsRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    match wallet_service
        .convert_points_to_wallet(&path.into_inner(), request.points, request.branch_id.as_deref())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/{id}/wallet/topup",
    tag = "wallet",
    params(("id" = String, Path, description = "顾客ID")),
    request_body = AmountRequest,
    responses(
        (status = 200, description = "充值成功", body = Transaction),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "钱包不存在")
    )
)]
pub async fn topup(
    wallet_service: web::Data<WalletService>,
    path: web::Path<String>,
    request: web::Json<AmountRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let description = description_or(request.description, "Wallet top-up");
    match wallet_service
        .add_to_wallet_balance(&path.into_inner(), request.amount, &description, request.reference_id)
        .await
    {
        Ok(tx) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": tx
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/{id}/wallet/deduct",
    tag = "wallet",
    params(("id" = String, Path, description = "顾客ID")),
    request_body = AmountRequest,
    responses(
        (status = 200, description = "扣款成功", body = Transaction),
        (status = 404, description = "钱包不存在"),
        (status = 422, description = "余额不足")
    )
)]
pub async fn deduct(
    wallet_service: web::Data<WalletService>,
    path: web::Path<String>,
    request: web::Json<AmountRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let description = description_or(request.description, "Wallet payment");
    match wallet_service
        .deduct_from_wallet_balance(&path.into_inner(), request.amount, &description, request.reference_id)
        .await
    {
        Ok(tx) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": tx
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/{id}/wallet/refund",
    tag = "wallet",
    params(("id" = String, Path, description = "顾客ID")),
    request_body = AmountRequest,
    responses(
        (status = 200, description = "退款成功", body = Transaction),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "钱包不存在")
    )
)]
pub async fn refund(
    wallet_service: web::Data<WalletService>,
    path: web::Path<String>,
    request: web::Json<AmountRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let description = description_or(request.description, "Refund");
    match wallet_service
        .refund_to_wallet(&path.into_inner(), request.amount, &description, request.reference_id)
        .await
    {
        Ok(tx) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": tx
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn wallet_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/customers/{id}/wallet")
            .route("", web::post().to(create_wallet))
            .route("", web::get().to(get_wallet))
            .route("/transactions", web::get().to(list_transactions))
            .route("/points/add", web::post().to(add_points))
            .route("/points/redeem", web::post().to(redeem_points))
            .route("/points/convert", web::post().to(convert_points))
            .route("/topup", web::post().to(topup))
            .route("/deduct", web::post().to(deduct))
            .route("/refund", web::post().to(refund)),
    );
}
