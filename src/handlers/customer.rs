use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::CustomerService;

#[utoipa::path(
    post,
    path = "/customers",
    tag = "customer",
    request_body = RegisterCustomerRequest,
    responses(
        (status = 201, description = "注册成功", body = RegisterCustomerResponse),
        (status = 400, description = "请求参数错误"),
        (status = 409, description = "邮箱已注册")
    )
)]
pub async fn register_customer(
    customer_service: web::Data<CustomerService>,
    request: web::Json<RegisterCustomerRequest>,
) -> Result<HttpResponse> {
    match customer_service.register_customer(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customers",
    tag = "customer",
    params(
        ("search" = Option<String>, Query, description = "按姓名、邮箱或电话搜索"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    responses(
        (status = 200, description = "获取顾客列表成功")
    )
)]
pub async fn list_customers(
    customer_service: web::Data<CustomerService>,
    query: web::Query<CustomerQuery>,
) -> Result<HttpResponse> {
    match customer_service.list_customers(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "customer",
    params(("id" = String, Path, description = "顾客ID")),
    responses(
        (status = 200, description = "获取顾客成功", body = Customer),
        (status = 404, description = "顾客不存在")
    )
)]
pub async fn get_customer(
    customer_service: web::Data<CustomerService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match customer_service.get_customer(&path.into_inner()).await {
        Ok(customer) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": customer
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customers/{id}/profile",
    tag = "customer",
    params(("id" = String, Path, description = "顾客ID")),
    responses(
        (status = 200, description = "获取顾客资料成功", body = CustomerProfileResponse),
        (status = 404, description = "顾客不存在")
    )
)]
pub async fn get_customer_profile(
    customer_service: web::Data<CustomerService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match customer_service.get_customer_profile(&path.into_inner()).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/customers/{id}",
    tag = "customer",
    params(("id" = String, Path, description = "顾客ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "更新顾客成功", body = Customer),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "顾客不存在"),
        (status = 409, description = "邮箱已注册")
    )
)]
pub async fn update_customer(
    customer_service: web::Data<CustomerService>,
    path: web::Path<String>,
    request: web::Json<UpdateCustomerRequest>,
) -> Result<HttpResponse> {
    match customer_service
        .update_customer(&path.into_inner(), request.into_inner())
        .await
    {
        Ok(customer) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": customer
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/customers/{id}",
    tag = "customer",
    params(("id" = String, Path, description = "顾客ID")),
    responses(
        (status = 200, description = "删除顾客成功"),
        (status = 404, description = "顾客不存在")
    )
)]
pub async fn delete_customer(
    customer_service: web::Data<CustomerService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match customer_service.delete_customer(&id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "id": id, "deleted": true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn customer_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/customers", web::post().to(register_customer))
        .route("/customers", web::get().to(list_customers))
        .route("/customers/{id}", web::get().to(get_customer))
        .route("/customers/{id}", web::put().to(update_customer))
        .route("/customers/{id}", web::delete().to(delete_customer))
        .route("/customers/{id}/profile", web::get().to(get_customer_profile));
}
