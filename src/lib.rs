//! Attendify - 学校考勤与排课后端服务
//!
//! 基于 Actix Web 构建，提供考试座位分配、周课表与补课时段管理、人脸识别点名对接等功能。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis）
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证授权中间件
//! - `models`: 数据模型定义（课表与座位分配算法位于此处）
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
