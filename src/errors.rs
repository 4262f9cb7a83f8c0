//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_attendify_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum AttendifyError {
            $($variant(String),)*
        }

        impl AttendifyError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(AttendifyError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(AttendifyError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(AttendifyError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl AttendifyError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        AttendifyError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_attendify_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DateParse("E010", "Date Parse Error"),
    Authentication("E011", "Authentication Error"),
    Authorization("E012", "Authorization Error"),
    Conflict("E013", "Conflict"),
    ScheduleCorrupted("E014", "Schedule Corrupted"),
    CapacityExceeded("E015", "Capacity Exceeded"),
}

impl AttendifyError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AttendifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AttendifyError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AttendifyError {
    fn from(err: sea_orm::DbErr) -> Self {
        AttendifyError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AttendifyError {
    fn from(err: std::io::Error) -> Self {
        AttendifyError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AttendifyError {
    fn from(err: serde_json::Error) -> Self {
        AttendifyError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for AttendifyError {
    fn from(err: chrono::ParseError) -> Self {
        AttendifyError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AttendifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AttendifyError::cache_connection("test").code(), "E001");
        assert_eq!(AttendifyError::database_config("test").code(), "E003");
        assert_eq!(AttendifyError::validation("test").code(), "E007");
        assert_eq!(AttendifyError::authentication("test").code(), "E011");
        assert_eq!(AttendifyError::schedule_corrupted("test").code(), "E014");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            AttendifyError::cache_connection("test").error_type(),
            "Cache Connection Error"
        );
        assert_eq!(
            AttendifyError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_error_message() {
        let err = AttendifyError::validation("Invalid input");
        assert_eq!(err.message(), "Invalid input");
    }

    #[test]
    fn test_db_err_conversion() {
        let err: AttendifyError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.code(), "E005");
        assert!(err.message().contains("boom"));
    }

    #[test]
    fn test_format_simple() {
        let err = AttendifyError::validation("Invalid URL");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid URL"));
    }
}
