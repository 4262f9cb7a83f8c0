use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 分页查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationQuery {
    #[serde(
        default = "default_page",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub page: i64,
    #[serde(
        default = "default_size",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub size: i64,
}

// 分页响应信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

// 启用状态筛选
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub enum ActiveFilter {
    #[default]
    #[serde(alias = "true")]
    Active,
    #[serde(alias = "false")]
    Inactive,
    All,
}

impl ActiveFilter {
    /// 转换为 is_active 条件，All 表示不过滤
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ActiveFilter::Active => Some(true),
            ActiveFilter::Inactive => Some(false),
            ActiveFilter::All => None,
        }
    }
}

// 自定义反序列化函数，支持字符串到i64的转换
fn deserialize_string_to_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected, Visitor};
    use std::fmt;

    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            if value <= i64::MAX as u64 {
                Ok(value as i64)
            } else {
                Err(Error::invalid_value(Unexpected::Unsigned(value), &self))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            value
                .parse()
                .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { page: 1, size: 10 }
    }
}

impl PaginationInfo {
    /// 由页码、页大小与总数计算分页信息
    pub fn new(page: u64, page_size: u64, total: u64, total_pages: u64) -> Self {
        Self {
            page: page as i64,
            page_size: page_size as i64,
            total: total as i64,
            total_pages: total_pages as i64,
        }
    }
}

/// 规范化分页参数：页码至少为 1，页大小限制在 1..=100
pub fn normalize_pagination(page: Option<i64>, size: Option<i64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1) as u64;
    let size = size.unwrap_or(10).clamp(1, 100) as u64;
    (page, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pagination() {
        assert_eq!(normalize_pagination(None, None), (1, 10));
        assert_eq!(normalize_pagination(Some(0), Some(1000)), (1, 100));
        assert_eq!(normalize_pagination(Some(3), Some(0)), (3, 1));
    }

    #[test]
    fn test_pagination_query_accepts_strings() {
        let query: PaginationQuery =
            serde_json::from_str(r#"{"page":"2","size":25}"#).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.size, 25);
    }

    #[test]
    fn test_active_filter() {
        assert_eq!(ActiveFilter::default().as_flag(), Some(true));
        let parsed: ActiveFilter = serde_json::from_str(r#""false""#).unwrap();
        assert_eq!(parsed, ActiveFilter::Inactive);
        assert_eq!(ActiveFilter::All.as_flag(), None);
    }
}
