//! 输入格式校验

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").expect("Invalid code regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()-]{7,20}$").expect("Invalid phone regex"));

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if !USERNAME_RE.is_match(username) {
        return Err(
            "Username must be 3-32 characters of letters, digits, dots, underscores or hyphens",
        );
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 学号、班级代码
pub fn validate_code(code: &str, field: &str) -> Result<(), String> {
    if !CODE_RE.is_match(code) {
        return Err(format!(
            "{field} must be 1-32 characters of letters, digits, underscores or hyphens"
        ));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if !PHONE_RE.is_match(phone) {
        return Err("Phone number format is invalid");
    }
    Ok(())
}

/// 姓名、标题等必填文本
pub fn validate_required(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(format!("{field} is required"));
    }
    if len > max_len {
        return Err(format!("{field} must be at most {max_len} characters"));
    }
    Ok(())
}

/// YYYY-MM-DD
pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("{field} must be a date in YYYY-MM-DD format"))
}

/// HH:MM，返回规范化后的字符串
pub fn normalize_time(value: &str, field: &str) -> Result<String, String> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| format!("{field} must be a time in HH:MM format"))
}

/// 密码策略：至少 8 位，同时包含字母和数字
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert!(validate_username("ayse.k").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn test_email_and_phone() {
        assert!(validate_email("hoca@okul.edu.tr").is_ok());
        assert!(validate_email("hoca@okul").is_err());
        assert!(validate_phone("+90 (532) 123-4567").is_ok());
        assert!(validate_phone("abc").is_err());
    }

    #[test]
    fn test_code() {
        assert!(validate_code("10-A", "class_code").is_ok());
        assert!(validate_code("", "class_code").is_err());
        assert!(validate_code("10 A", "class_code").is_err());
    }

    #[test]
    fn test_date_and_time() {
        assert_eq!(
            parse_date("2025-06-01", "exam_date").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert!(parse_date("01.06.2025", "exam_date").is_err());
        assert_eq!(normalize_time("9:05", "exam_time").unwrap(), "09:05");
        assert_eq!(normalize_time("13:30:00", "exam_time").unwrap(), "13:30");
        assert!(normalize_time("25:00", "exam_time").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Ogretmen1").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("12345678").is_err());
    }

    #[test]
    fn test_required() {
        assert!(validate_required("Ali", "first_name", 50).is_ok());
        assert!(validate_required("   ", "first_name", 50).is_err());
        assert!(validate_required(&"x".repeat(51), "first_name", 50).is_err());
    }
}
