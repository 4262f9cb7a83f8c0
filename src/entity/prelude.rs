//! 预导入模块，方便使用

pub use super::attendance_details::{
    ActiveModel as AttendanceDetailActiveModel, Entity as AttendanceDetails,
    Model as AttendanceDetailModel,
};
pub use super::attendances::{
    ActiveModel as AttendanceActiveModel, Entity as Attendances, Model as AttendanceModel,
};
pub use super::classes::{ActiveModel as ClassActiveModel, Entity as Classes, Model as ClassModel};
pub use super::exam_seating::{
    ActiveModel as ExamSeatActiveModel, Entity as ExamSeating, Model as ExamSeatModel,
};
pub use super::exams::{ActiveModel as ExamActiveModel, Entity as Exams, Model as ExamModel};
pub use super::feedbacks::{
    ActiveModel as FeedbackActiveModel, Entity as Feedbacks, Model as FeedbackModel,
};
pub use super::student_classes::{
    ActiveModel as StudentClassActiveModel, Entity as StudentClasses, Model as StudentClassModel,
};
pub use super::student_photos::{
    ActiveModel as StudentPhotoActiveModel, Entity as StudentPhotos, Model as StudentPhotoModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::system_stats::{
    ActiveModel as SystemStatActiveModel, Entity as SystemStats, Model as SystemStatModel,
};
pub use super::teacher_classes::{
    ActiveModel as TeacherClassActiveModel, Entity as TeacherClasses, Model as TeacherClassModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
