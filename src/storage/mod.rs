use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::models::{
    attendances::{
        entities::{Attendance, AttendanceSummary},
        requests::NewAttendance,
        responses::{AttendanceDetailResponse, AttendanceStatsResponse},
    },
    classes::{
        entities::{Class, ClassDetail, ClassStudent, ClassSummary},
        requests::{ClassListQuery, ClassUpdate, NewClass, ScheduleOptions},
        responses::ClassListResponse,
        schedule::{HourSlot, ScheduleOutcome, Weekday, WeeklySchedule},
    },
    dashboard::responses::DashboardResponse,
    exams::{
        entities::{CreatedExam, ExamSummary},
        requests::{NewExam, SeatingOptions},
        responses::ExamDetailResponse,
    },
    feedbacks::{
        entities::{Feedback, FeedbackWithTeacher},
        requests::NewFeedback,
    },
    students::{
        entities::{Student, StudentDetail, TeacherStudent},
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    users::{
        entities::{TeacherWithClasses, User},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::TeacherListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（教师可同时分配班级）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 列出教师
    async fn list_teachers_with_pagination(
        &self,
        query: UserListQuery,
    ) -> Result<TeacherListResponse>;
    // 获取教师及其班级
    async fn get_teacher_with_classes(&self, id: i64) -> Result<Option<TeacherWithClasses>>;
    // 全部教师（导出用）
    async fn list_all_teachers(&self) -> Result<Vec<TeacherWithClasses>>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 启用/停用用户
    async fn set_user_active(&self, id: i64, active: bool) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 管理员数量
    async fn count_admins(&self) -> Result<u64>;

    /// 学生管理方法
    // 创建学生、照片与选课
    async fn create_student(&self, student: CreateStudentRequest) -> Result<StudentDetail>;
    async fn get_student_by_id(&self, id: i64) -> Result<Option<StudentDetail>>;
    async fn get_student_by_number(&self, student_number: &str) -> Result<Option<Student>>;
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse>;
    // 全部学生（导出用）
    async fn list_all_students(&self) -> Result<Vec<StudentDetail>>;
    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<StudentDetail>>;
    async fn set_student_active(&self, id: i64, active: bool) -> Result<bool>;

    /// 班级管理方法
    async fn create_class(&self, class: NewClass) -> Result<Class>;
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;
    async fn get_class_by_code(&self, class_code: &str) -> Result<Option<Class>>;
    // 班级详情（教师与学生）
    async fn get_class_detail(
        &self,
        class_id: i64,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<Option<ClassDetail>>;
    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<ClassListResponse>;
    // 全部启用班级（导出用）
    async fn list_all_classes(&self) -> Result<Vec<ClassSummary>>;
    async fn update_class(&self, class_id: i64, update: ClassUpdate) -> Result<Option<Class>>;
    // 停用班级
    async fn deactivate_class(&self, class_id: i64) -> Result<bool>;
    // 班级名单（仅启用学生）
    async fn list_class_roster(&self, class_id: i64) -> Result<Vec<ClassStudent>>;

    /// 课表管理方法
    // 清理所有班级中过期的补课时段，返回发生变化的班级数
    async fn prune_expired_makeups(&self, now: DateTime<Utc>, makeup_ttl: TimeDelta)
    -> Result<usize>;
    // 读取多个班级的课表
    async fn get_class_schedules(
        &self,
        class_ids: &[i64],
        strict: bool,
    ) -> ScheduleOutcome<Vec<(i64, WeeklySchedule)>>;
    // 添加常规时段
    async fn add_class_slot(
        &self,
        class_id: i64,
        day: Weekday,
        hour: HourSlot,
        options: ScheduleOptions,
    ) -> ScheduleOutcome<WeeklySchedule>;
    // 删除时段
    async fn remove_class_slot(
        &self,
        class_id: i64,
        day: Weekday,
        hour: HourSlot,
        options: ScheduleOptions,
    ) -> ScheduleOutcome<WeeklySchedule>;
    // 多班级补课预约
    async fn book_makeup_slots(
        &self,
        class_ids: &[i64],
        cells: &[(Weekday, HourSlot)],
        now: DateTime<Utc>,
        options: ScheduleOptions,
    ) -> ScheduleOutcome<Vec<(i64, WeeklySchedule)>>;

    /// 教师授课方法
    async fn is_teacher_of_class(&self, teacher_id: i64, class_id: i64) -> Result<bool>;
    async fn list_teacher_class_ids(&self, teacher_id: i64) -> Result<Vec<i64>>;
    // 教师的班级及学生
    async fn list_teacher_classes(
        &self,
        teacher_id: i64,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<Vec<ClassDetail>>;
    // 教师的学生（按学生去重）
    async fn list_teacher_students(&self, teacher_id: i64) -> Result<Vec<TeacherStudent>>;
    // 教师的班级数与学生数
    async fn count_teacher_classes_and_students(&self, teacher_id: i64) -> Result<(i64, i64)>;

    /// 考试管理方法
    // 创建考试并分配座位
    async fn create_exam_with_seating(
        &self,
        exam: NewExam,
        options: SeatingOptions,
    ) -> Result<CreatedExam>;
    async fn get_exam_detail(&self, exam_id: i64) -> Result<Option<ExamDetailResponse>>;
    async fn list_exams(&self, past: bool, today: NaiveDate) -> Result<Vec<ExamSummary>>;
    async fn list_teacher_exams(&self, teacher_id: i64) -> Result<Vec<ExamSummary>>;
    async fn delete_exam(&self, exam_id: i64) -> Result<bool>;

    /// 点名管理方法
    // 保存点名结果并累计缺勤
    async fn submit_attendance(&self, attendance: NewAttendance) -> Result<Attendance>;
    async fn get_attendance_detail(
        &self,
        attendance_id: i64,
    ) -> Result<Option<AttendanceDetailResponse>>;
    async fn list_attendances(
        &self,
        teacher_id: Option<i64>,
        class_id: Option<i64>,
        since: NaiveDate,
    ) -> Result<Vec<AttendanceSummary>>;
    async fn get_attendance_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AttendanceStatsResponse>;

    /// 反馈管理方法
    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback>;
    async fn list_teacher_feedbacks(
        &self,
        teacher_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Feedback>>;
    async fn list_unread_feedbacks(&self, limit: Option<u64>) -> Result<Vec<FeedbackWithTeacher>>;
    async fn list_recent_feedbacks(&self, since: DateTime<Utc>) -> Result<Vec<FeedbackWithTeacher>>;
    async fn mark_feedback_read(&self, feedback_id: i64) -> Result<bool>;

    /// 系统统计方法
    async fn record_login(&self, date: NaiveDate) -> Result<()>;
    async fn increment_ai_usage(&self, date: NaiveDate) -> Result<()>;
    async fn get_dashboard(&self, today: NaiveDate) -> Result<DashboardResponse>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
