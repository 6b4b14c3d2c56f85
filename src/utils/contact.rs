use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+1\d{10}$").expect("valid phone regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
    })
}

/// 验证美国手机号格式
pub fn validate_us_phone(phone: &str) -> AppResult<()> {
    if !phone_regex().is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number, expected US format (+1xxxxxxxxxx)".to_string(),
        ));
    }

    Ok(())
}

/// 格式化手机号，确保以+1开头
pub fn format_us_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 11 && digits.starts_with('1') {
        format!("+{}", digits)
    } else if digits.len() == 10 {
        format!("+1{}", digits)
    } else {
        phone.to_string()
    }
}

/// 校验并规范化邮箱(去空白、转小写)
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(AppError::ValidationError(format!(
            "Invalid email address: {email}"
        )));
    }
    Ok(email)
}
