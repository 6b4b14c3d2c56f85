use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::PurchaseService;

#[utoipa::path(
    post,
    path = "/purchases/complete",
    tag = "purchase",
    request_body = CompletePurchaseRequest,
    responses(
        (status = 200, description = "预约或订单入账成功；重复提交返回已入账记录", body = PurchaseReceipt),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "顾客或钱包不存在"),
        (status = 422, description = "余额或积分不足")
    )
)]
pub async fn complete_purchase(
    purchase_service: web::Data<PurchaseService>,
    request: web::Json<CompletePurchaseRequest>,
) -> Result<HttpResponse> {
    match purchase_service.complete_purchase(request.into_inner()).await {
        Ok(receipt) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": receipt
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/purchases/refund",
    tag = "purchase",
    request_body = RefundPurchaseRequest,
    responses(
        (status = 200, description = "退款成功", body = RefundReceipt),
        (status = 404, description = "入账记录不存在"),
        (status = 409, description = "已退款")
    )
)]
pub async fn refund_purchase(
    purchase_service: web::Data<PurchaseService>,
    request: web::Json<RefundPurchaseRequest>,
) -> Result<HttpResponse> {
    match purchase_service.refund_purchase(request.into_inner()).await {
        Ok(receipt) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": receipt
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn purchase_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/purchases")
            .route("/complete", web::post().to(complete_purchase))
            .route("/refund", web::post().to(refund_purchase)),
    );
}
