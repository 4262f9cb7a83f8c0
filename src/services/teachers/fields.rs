use crate::utils::validate::{parse_date, validate_email, validate_phone, validate_required};

/// 空白字符串视为未提供
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn validate_full_name(full_name: &str) -> Result<(), String> {
    validate_required(full_name, "full_name", 100)
}

/// 邮箱、电话、出生日期
pub(crate) fn validate_contact(
    email: Option<&str>,
    phone: Option<&str>,
    birth_date: Option<&str>,
) -> Result<(), String> {
    if let Some(email) = email {
        validate_email(email)?;
    }
    if let Some(phone) = phone {
        validate_phone(phone)?;
    }
    if let Some(birth_date) = birth_date {
        parse_date(birth_date, "birth_date")?;
    }
    Ok(())
}

/// 授课班级：必须为正数，去重排序
pub(crate) fn normalize_class_ids(mut class_ids: Vec<i64>) -> Result<Vec<i64>, String> {
    if class_ids.iter().any(|id| *id <= 0) {
        return Err("class_ids must contain valid class ids".to_string());
    }
    class_ids.sort_unstable();
    class_ids.dedup();
    Ok(class_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_validation() {
        assert!(validate_contact(Some("ogretmen@okul.edu.tr"), Some("+90 532 000 00 00"), Some("1985-04-12")).is_ok());
        assert!(validate_contact(Some("invalid"), None, None).is_err());
        assert!(validate_contact(None, None, Some("12.04.1985")).is_err());
        assert!(validate_contact(None, None, None).is_ok());
    }

    #[test]
    fn test_normalize_class_ids() {
        assert_eq!(normalize_class_ids(vec![3, 1, 3]).unwrap(), vec![1, 3]);
        assert!(normalize_class_ids(vec![1, -2]).is_err());
        assert_eq!(normalize_optional(Some("  ".into())), None);
    }
}
