use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::customer::register_customer,
        handlers::customer::list_customers,
        handlers::customer::get_customer,
        handlers::customer::get_customer_profile,
        handlers::customer::update_customer,
        handlers::customer::delete_customer,
        handlers::wallet::create_wallet,
        handlers::wallet::get_wallet,
        handlers::wallet::list_transactions,
        handlers::wallet::add_points,
        handlers::wallet::redeem_points,
        handlers::wallet::convert_points,
        handlers::wallet::topup,
        handlers::wallet::deduct,
        handlers::wallet::refund,
        handlers::loyalty_settings::list_settings,
        handlers::loyalty_settings::create_settings,
        handlers::loyalty_settings::get_active_settings,
        handlers::loyalty_settings::calculate,
        handlers::loyalty_settings::get_settings,
        handlers::loyalty_settings::update_settings,
        handlers::loyalty_settings::delete_settings,
        handlers::purchase::complete_purchase,
        handlers::purchase::refund_purchase,
        handlers::admin::check_integrity,
        handlers::admin::run_birthday_rewards,
        handlers::admin::run_points_expiry,
    ),
    components(
        schemas(
            Customer,
            RegisterCustomerRequest,
            RegisterCustomerResponse,
            UpdateCustomerRequest,
            CustomerProfileResponse,
            Wallet,
            PointsRequest,
            AmountRequest,
            ConvertPointsRequest,
            ConversionResponse,
            Transaction,
            TransactionType,
            LoyaltySettings,
            CreateLoyaltySettingsRequest,
            UpdateLoyaltySettingsRequest,
            CalculationResponse,
            PurchaseKind,
            PaymentMethod,
            CompletePurchaseRequest,
            PurchaseRecord,
            PurchaseReceipt,
            RefundPurchaseRequest,
            RefundReceipt,
            IntegrityReport,
            BirthdayRunRequest,
            BirthdayRunResponse,
            ExpiryRunResponse,
            PaginationInfo,
            ApiError,
        )
    ),
    tags(
        (name = "customer", description = "Customer registry API"),
        (name = "wallet", description = "Wallet and points ledger API"),
        (name = "loyalty", description = "Loyalty settings API"),
        (name = "purchase", description = "Booking and product purchase API"),
        (name = "admin", description = "Maintenance API"),
    ),
    info(
        title = "Salon Ledger API",
        version = "1.0.0",
        description = "Customer wallet and loyalty points REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
