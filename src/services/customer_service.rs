use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::store::Store;
use crate::utils::{CUSTOMER_PREFIX, format_us_phone, generate_id, normalize_email, validate_us_phone};
use chrono::{NaiveDate, Utc};

#[derive(Clone)]
pub struct CustomerService {
    store: Store,
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(AppError::ValidationError(
            "Name length must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn parse_birthday(birthday: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(birthday.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError("Invalid birthday format".to_string()))
}

fn parse_phone(phone: &str) -> AppResult<String> {
    let phone = format_us_phone(phone.trim());
    validate_us_phone(&phone)?;
    Ok(phone)
}

/// 空字符串表示清空该字段
fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl CustomerService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// 注册顾客：创建档案、钱包，并按积分配置发放首单奖励，三步在同一事务内完成
    pub async fn register_customer(
        &self,
        request: RegisterCustomerRequest,
    ) -> AppResult<RegisterCustomerResponse> {
        // 验证输入
        let email = normalize_email(&request.email)?;
        let name = validate_name(&request.name)?;
        let phone = request
            .phone
            .as_deref()
            .and_then(non_empty)
            .map(|p| parse_phone(&p))
            .transpose()?;
        let birthday = request
            .birthday
            .as_deref()
            .and_then(non_empty)
            .map(|b| parse_birthday(&b))
            .transpose()?;

        let response = self
            .store
            .transact(move |state| {
                if state.customer_by_email(&email).is_some() {
                    return Err(AppError::Conflict(format!(
                        "Email already registered: {email}"
                    )));
                }

                let now = Utc::now();
                let customer = Customer {
                    id: generate_id(CUSTOMER_PREFIX),
                    email,
                    name,
                    phone,
                    birthday,
                    preferred_branch_id: request.preferred_branch_id.as_deref().and_then(non_empty),
                    notes: request.notes.as_deref().and_then(non_empty),
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                };
                state.customers.push(customer.clone());
                state.create_wallet(&customer.id, now)?;

                let bonus = state
                    .active_settings(customer.preferred_branch_id.as_deref())
                    .map(|s| s.bonus_points_first_booking)
                    .unwrap_or(0);
                if bonus > 0 {
                    state.add_points(&customer.id, bonus, "First booking bonus", None, now)?;
                }

                let wallet = state.require_wallet(&customer.id)?.clone();
                Ok(RegisterCustomerResponse {
                    customer,
                    wallet,
                    bonus_points: bonus.max(0),
                })
            })
            .await?;

        log::info!(
            "Registered customer {} (bonus points: {})",
            response.customer.id,
            response.bonus_points
        );
        Ok(response)
    }

    pub async fn get_customer(&self, id: &str) -> AppResult<Customer> {
        self.store
            .read(|state| state.require_customer(id).cloned())
            .await
    }

    /// 顾客资料及钱包
    pub async fn get_customer_profile(&self, id: &str) -> AppResult<CustomerProfileResponse> {
        self.store
            .read(|state| {
                let customer = state.require_customer(id)?.clone();
                let wallet = state.wallet(id).cloned();
                Ok(CustomerProfileResponse { customer, wallet })
            })
            .await
    }

    /// 浅合并更新，只修改请求中提供的字段
    pub async fn update_customer(
        &self,
        id: &str,
        request: UpdateCustomerRequest,
    ) -> AppResult<Customer> {
        // 检查是否有需要更新的字段
        if request.is_empty() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let email = request.email.as_deref().map(normalize_email).transpose()?;
        let name = request.name.as_deref().map(validate_name).transpose()?;
        let phone = request
            .phone
            .as_deref()
            .map(|p| non_empty(p).map(|p| parse_phone(&p)).transpose())
            .transpose()?;
        let birthday = request
            .birthday
            .as_deref()
            .map(|b| non_empty(b).map(|b| parse_birthday(&b)).transpose())
            .transpose()?;

        let id = id.to_string();
        self.store
            .transact(move |state| {
                if let Some(email) = &email
                    && state
                        .customer_by_email(email)
                        .is_some_and(|other| other.id != id)
                {
                    return Err(AppError::Conflict(format!(
                        "Email already registered: {email}"
                    )));
                }

                let customer = state
                    .customer_mut(&id)
                    .ok_or_else(|| AppError::NotFound(format!("Customer not found: {id}")))?;
                if let Some(email) = email {
                    customer.email = email;
                }
                if let Some(name) = name {
                    customer.name = name;
                }
                if let Some(phone) = phone {
                    customer.phone = phone;
                }
                if let Some(birthday) = birthday {
                    customer.birthday = birthday;
                }
                if let Some(branch) = &request.preferred_branch_id {
                    customer.preferred_branch_id = non_empty(branch);
                }
                if let Some(notes) = &request.notes {
                    customer.notes = non_empty(notes);
                }
                customer.updated_at = Utc::now();
                Ok(customer.clone())
            })
            .await
    }

    /// 软删除：档案从查询中消失，钱包与流水保留用于审计但不再允许变动
    pub async fn delete_customer(&self, id: &str) -> AppResult<()> {
        let target = id.to_string();
        self.store
            .transact(move |state| {
                let id = target;
                let customer = state
                    .customer_mut(&id)
                    .ok_or_else(|| AppError::NotFound(format!("Customer not found: {id}")))?;
                let now = Utc::now();
                customer.deleted_at = Some(now);
                customer.updated_at = now;
                Ok(())
            })
            .await?;

        log::info!("Soft-deleted customer {id}");
        Ok(())
    }

    pub async fn list_customers(&self, query: &CustomerQuery) -> AppResult<PaginatedResponse<Customer>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let mut customers: Vec<Customer> = self
            .store
            .read(|state| {
                state
                    .live_customers()
                    .filter(|c| search.is_none_or(|needle| c.matches(needle)))
                    .cloned()
                    .collect()
            })
            .await;
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(PaginatedResponse::paginate(customers, &params))
    }
}
