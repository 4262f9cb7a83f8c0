//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod attendance_details;
pub mod attendances;
pub mod classes;
pub mod exam_seating;
pub mod exams;
pub mod feedbacks;
pub mod student_classes;
pub mod student_photos;
pub mod students;
pub mod system_stats;
pub mod teacher_classes;
pub mod users;
