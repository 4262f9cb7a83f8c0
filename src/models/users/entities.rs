use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色
#[derive(Debug, Clone, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum UserRole {
    Teacher, // 教师
    Admin,   // 管理员
}

impl UserRole {
    pub const TEACHER: &'static str = "teacher";
    pub const ADMIN: &'static str = "admin";

    pub fn admin_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin]
    }
    pub fn teacher_roles() -> &'static [&'static UserRole] {
        &[&Self::Teacher]
    }
    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Teacher, &Self::Admin]
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: teacher, admin"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Teacher => write!(f, "{}", UserRole::TEACHER),
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::TEACHER => Ok(UserRole::Teacher),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户实体（管理员或教师）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    // 生成 token 对（access + refresh）
    pub fn generate_token_pair(
        &self,
        refresh_token_expiry: Option<chrono::TimeDelta>,
    ) -> Result<crate::utils::jwt::TokenPair, String> {
        crate::utils::jwt::JwtUtils::generate_token_pair(
            self.id,
            &self.role.to_string(),
            refresh_token_expiry,
        )
        .map_err(|e| format!("生成 token 对失败: {e}"))
    }
}

// 教师附带的班级摘要
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct ClassBrief {
    pub id: i64,
    pub class_name: String,
    pub class_code: String,
}

// 教师及其负责的班级
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct TeacherWithClasses {
    #[serde(flatten)]
    #[ts(flatten)]
    pub user: User,
    pub classes: Vec<ClassBrief>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("teacher".parse::<UserRole>().unwrap(), UserRole::Teacher);
        assert!("user".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Teacher.to_string(), "teacher");
    }

    #[test]
    fn test_role_deserialize_error() {
        let result = serde_json::from_str::<UserRole>(r#""student""#);
        assert!(result.is_err());
    }
}
