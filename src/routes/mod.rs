pub mod admin;

pub mod attendances;

pub mod auth;

pub mod classes;

pub mod exams;

pub mod feedbacks;

pub mod students;

pub mod teacher;

pub mod teachers;

pub use admin::configure_admin_routes;
pub use attendances::configure_attendances_routes;
pub use auth::configure_auth_routes;
pub use classes::configure_classes_routes;
pub use exams::configure_exams_routes;
pub use feedbacks::configure_feedbacks_routes;
pub use students::configure_students_routes;
pub use teacher::configure_teacher_routes;
pub use teachers::configure_teachers_routes;
