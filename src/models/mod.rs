//! 数据模型定义
//!
//! 每个业务模块下分为 entities（业务实体）、requests（请求）、responses（响应）。

pub mod attendances;
pub mod auth;
pub mod classes;
pub mod common;
pub mod dashboard;
pub mod exams;
pub mod feedbacks;
pub mod students;
pub mod users;

pub use common::{
    ActiveFilter, ApiResponse, AppStartTime, ErrorCode, PaginationInfo,
    PaginationQuery,
};
