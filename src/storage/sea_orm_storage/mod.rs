//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod attendances;
mod classes;
mod exams;
mod feedbacks;
mod schedules;
mod stats;
mod students;
mod teaching;
mod users;

use crate::config::AppConfig;
use crate::errors::{AttendifyError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 基于已有连接创建存储实例（不运行迁移）
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| AttendifyError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| AttendifyError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| AttendifyError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(AttendifyError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn list_teachers_with_pagination(
        &self,
        query: UserListQuery,
    ) -> Result<TeacherListResponse> {
        self.list_teachers_with_pagination_impl(query).await
    }

    async fn get_teacher_with_classes(&self, id: i64) -> Result<Option<TeacherWithClasses>> {
        self.get_teacher_with_classes_impl(id).await
    }

    async fn list_all_teachers(&self) -> Result<Vec<TeacherWithClasses>> {
        self.list_all_teachers_impl().await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn set_user_active(&self, id: i64, active: bool) -> Result<bool> {
        self.set_user_active_impl(id, active).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_admins(&self) -> Result<u64> {
        self.count_admins_impl().await
    }

    // 学生模块
    async fn create_student(&self, student: CreateStudentRequest) -> Result<StudentDetail> {
        self.create_student_impl(student).await
    }

    async fn get_student_by_id(&self, id: i64) -> Result<Option<StudentDetail>> {
        self.get_student_by_id_impl(id).await
    }

    async fn get_student_by_number(&self, student_number: &str) -> Result<Option<Student>> {
        self.get_student_by_number_impl(student_number).await
    }

    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        self.list_students_with_pagination_impl(query).await
    }

    async fn list_all_students(&self) -> Result<Vec<StudentDetail>> {
        self.list_all_students_impl().await
    }

    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<StudentDetail>> {
        self.update_student_impl(id, update).await
    }

    async fn set_student_active(&self, id: i64, active: bool) -> Result<bool> {
        self.set_student_active_impl(id, active).await
    }

    // 班级模块
    async fn create_class(&self, class: NewClass) -> Result<Class> {
        self.create_class_impl(class).await
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    async fn get_class_by_code(&self, class_code: &str) -> Result<Option<Class>> {
        self.get_class_by_code_impl(class_code).await
    }

    async fn get_class_detail(
        &self,
        class_id: i64,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<Option<ClassDetail>> {
        self.get_class_detail_impl(class_id, now, makeup_ttl).await
    }

    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<ClassListResponse> {
        self.list_classes_with_pagination_impl(query, now, makeup_ttl)
            .await
    }

    async fn list_all_classes(&self) -> Result<Vec<ClassSummary>> {
        self.list_all_classes_impl().await
    }

    async fn update_class(&self, class_id: i64, update: ClassUpdate) -> Result<Option<Class>> {
        self.update_class_impl(class_id, update).await
    }

    async fn deactivate_class(&self, class_id: i64) -> Result<bool> {
        self.deactivate_class_impl(class_id).await
    }

    async fn list_class_roster(&self, class_id: i64) -> Result<Vec<ClassStudent>> {
        self.list_class_roster_impl(class_id).await
    }

    // 课表模块
    async fn prune_expired_makeups(
        &self,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<usize> {
        self.prune_expired_makeups_impl(now, makeup_ttl).await
    }

    async fn get_class_schedules(
        &self,
        class_ids: &[i64],
        strict: bool,
    ) -> ScheduleOutcome<Vec<(i64, WeeklySchedule)>> {
        self.get_class_schedules_impl(class_ids, strict).await
    }

    async fn add_class_slot(
        &self,
        class_id: i64,
        day: Weekday,
        hour: HourSlot,
        options: ScheduleOptions,
    ) -> ScheduleOutcome<WeeklySchedule> {
        self.add_class_slot_impl(class_id, day, hour, options).await
    }

    async fn remove_class_slot(
        &self,
        class_id: i64,
        day: Weekday,
        hour: HourSlot,
        options: ScheduleOptions,
    ) -> ScheduleOutcome<WeeklySchedule> {
        self.remove_class_slot_impl(class_id, day, hour, options)
            .await
    }

    async fn book_makeup_slots(
        &self,
        class_ids: &[i64],
        cells: &[(Weekday, HourSlot)],
        now: DateTime<Utc>,
        options: ScheduleOptions,
    ) -> ScheduleOutcome<Vec<(i64, WeeklySchedule)>> {
        self.book_makeup_slots_impl(class_ids, cells, now, options)
            .await
    }

    // 教师授课模块
    async fn is_teacher_of_class(&self, teacher_id: i64, class_id: i64) -> Result<bool> {
        self.is_teacher_of_class_impl(teacher_id, class_id).await
    }

    async fn list_teacher_class_ids(&self, teacher_id: i64) -> Result<Vec<i64>> {
        self.list_teacher_class_ids_impl(teacher_id).await
    }

    async fn list_teacher_classes(
        &self,
        teacher_id: i64,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<Vec<ClassDetail>> {
        self.list_teacher_classes_impl(teacher_id, now, makeup_ttl)
            .await
    }

    async fn list_teacher_students(&self, teacher_id: i64) -> Result<Vec<TeacherStudent>> {
        self.list_teacher_students_impl(teacher_id).await
    }

    async fn count_teacher_classes_and_students(&self, teacher_id: i64) -> Result<(i64, i64)> {
        self.count_teacher_classes_and_students_impl(teacher_id)
            .await
    }

    // 考试模块
    async fn create_exam_with_seating(
        &self,
        exam: NewExam,
        options: SeatingOptions,
    ) -> Result<CreatedExam> {
        self.create_exam_with_seating_impl(exam, options).await
    }

    async fn get_exam_detail(&self, exam_id: i64) -> Result<Option<ExamDetailResponse>> {
        self.get_exam_detail_impl(exam_id).await
    }

    async fn list_exams(&self, past: bool, today: NaiveDate) -> Result<Vec<ExamSummary>> {
        self.list_exams_impl(past, today).await
    }

    async fn list_teacher_exams(&self, teacher_id: i64) -> Result<Vec<ExamSummary>> {
        self.list_teacher_exams_impl(teacher_id).await
    }

    async fn delete_exam(&self, exam_id: i64) -> Result<bool> {
        self.delete_exam_impl(exam_id).await
    }

    // 点名模块
    async fn submit_attendance(&self, attendance: NewAttendance) -> Result<Attendance> {
        self.submit_attendance_impl(attendance).await
    }

    async fn get_attendance_detail(
        &self,
        attendance_id: i64,
    ) -> Result<Option<AttendanceDetailResponse>> {
        self.get_attendance_detail_impl(attendance_id).await
    }

    async fn list_attendances(
        &self,
        teacher_id: Option<i64>,
        class_id: Option<i64>,
        since: NaiveDate,
    ) -> Result<Vec<AttendanceSummary>> {
        self.list_attendances_impl(teacher_id, class_id, since)
            .await
    }

    async fn get_attendance_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AttendanceStatsResponse> {
        self.get_attendance_stats_impl(start, end).await
    }

    // 反馈模块
    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback> {
        self.create_feedback_impl(feedback).await
    }

    async fn list_teacher_feedbacks(
        &self,
        teacher_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Feedback>> {
        self.list_teacher_feedbacks_impl(teacher_id, since).await
    }

    async fn list_unread_feedbacks(&self, limit: Option<u64>) -> Result<Vec<FeedbackWithTeacher>> {
        self.list_unread_feedbacks_impl(limit).await
    }

    async fn list_recent_feedbacks(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<FeedbackWithTeacher>> {
        self.list_recent_feedbacks_impl(since).await
    }

    async fn mark_feedback_read(&self, feedback_id: i64) -> Result<bool> {
        self.mark_feedback_read_impl(feedback_id).await
    }

    // 统计模块
    async fn record_login(&self, date: NaiveDate) -> Result<()> {
        self.record_login_impl(date).await
    }

    async fn increment_ai_usage(&self, date: NaiveDate) -> Result<()> {
        self.increment_ai_usage_impl(date).await
    }

    async fn get_dashboard(&self, today: NaiveDate) -> Result<DashboardResponse> {
        self.get_dashboard_impl(today).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SeaOrmStorage;
    use migration::{Migrator, MigratorTrait};

    /// 内存 SQLite 数据库，已执行全部迁移
    pub async fn setup_test_storage() -> SeaOrmStorage {
        let db = sea_orm::Database::connect("sqlite::memory:")
            .await
            .expect("connect in-memory sqlite");
        Migrator::up(&db, None).await.expect("run migrations");
        SeaOrmStorage::from_connection(db)
    }
}

#[cfg(test)]
mod tests {
    use super::SeaOrmStorage;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("attendify.db").unwrap(),
            "sqlite://attendify.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://u:p@localhost/db").unwrap(),
            "postgres://u:p@localhost/db"
        );
        assert!(SeaOrmStorage::build_database_url("ftp://nowhere").is_err());
    }
}
