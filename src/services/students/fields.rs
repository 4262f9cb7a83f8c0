//! 学生字段校验

use crate::utils::validate::{
    parse_date, validate_code, validate_email, validate_phone, validate_required,
};

/// 去掉首尾空白，空字符串视为未提供
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn validate_student_number(number: &str) -> Result<(), String> {
    validate_code(number.trim(), "student_number")
}

pub(crate) fn validate_name(value: &str, field: &str) -> Result<(), String> {
    validate_required(value, field, 50)
}

/// 可选的联系方式与生日
pub(crate) fn validate_contact(
    email: Option<&str>,
    phone: Option<&str>,
    birth_date: Option<&str>,
) -> Result<(), String> {
    if let Some(email) = email {
        validate_email(email).map_err(str::to_string)?;
    }
    if let Some(phone) = phone {
        validate_phone(phone).map_err(str::to_string)?;
    }
    if let Some(birth_date) = birth_date {
        parse_date(birth_date, "birth_date")?;
    }
    Ok(())
}

/// 解析 class_ids，支持逗号分隔
pub(crate) fn parse_class_ids(raw: &str) -> Result<Vec<i64>, String> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match part.parse::<i64>() {
            Ok(id) if id > 0 => ids.push(id),
            _ => return Err(format!("Invalid class id: {part}")),
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" a@b.co ".into())), Some("a@b.co".into()));
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn test_validate_contact() {
        assert!(validate_contact(Some("ogrenci@okul.edu.tr"), Some("+90 555 123 45 67"), Some("2010-05-01")).is_ok());
        assert!(validate_contact(Some("not-an-email"), None, None).is_err());
        assert!(validate_contact(None, None, Some("01.05.2010")).is_err());
        assert!(validate_contact(None, None, None).is_ok());
    }

    #[test]
    fn test_parse_class_ids() {
        assert_eq!(parse_class_ids("1, 2,,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_class_ids("").unwrap(), Vec::<i64>::new());
        assert!(parse_class_ids("1,x").is_err());
        assert!(parse_class_ids("-4").is_err());
    }
}
