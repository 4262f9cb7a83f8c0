use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建用户表（管理员与教师）
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Phone).string().null())
                    .col(ColumnDef::new(Users::BirthDate).string().null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::LastLogin).big_integer().null())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建学生表
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Students::StudentNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Students::FirstName).string().not_null())
                    .col(ColumnDef::new(Students::LastName).string().not_null())
                    .col(ColumnDef::new(Students::Email).string().null())
                    .col(ColumnDef::new(Students::Phone).string().null())
                    .col(ColumnDef::new(Students::BirthDate).string().null())
                    .col(
                        ColumnDef::new(Students::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Students::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Students::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建学生照片表
        manager
            .create_table(
                Table::create()
                    .table(StudentPhotos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentPhotos::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentPhotos::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentPhotos::PhotoType).string().not_null())
                    .col(ColumnDef::new(StudentPhotos::PhotoPath).string().not_null())
                    .col(ColumnDef::new(StudentPhotos::EncodingData).text().null())
                    .col(
                        ColumnDef::new(StudentPhotos::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentPhotos::Table, StudentPhotos::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建班级表
        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Classes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Classes::ClassName).string().not_null())
                    .col(
                        ColumnDef::new(Classes::ClassCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Classes::Description).text().null())
                    .col(
                        ColumnDef::new(Classes::MaxAbsences)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(Classes::WeeklySchedule).text().null())
                    .col(
                        ColumnDef::new(Classes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Classes::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Classes::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建学生选课表
        manager
            .create_table(
                Table::create()
                    .table(StudentClasses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentClasses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentClasses::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentClasses::ClassId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentClasses::AbsencesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentClasses::EnrolledAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentClasses::Table, StudentClasses::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentClasses::Table, StudentClasses::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建教师授课表
        manager
            .create_table(
                Table::create()
                    .table(TeacherClasses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeacherClasses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TeacherClasses::TeacherId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherClasses::ClassId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherClasses::AssignedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherClasses::Table, TeacherClasses::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherClasses::Table, TeacherClasses::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建考勤表
        manager
            .create_table(
                Table::create()
                    .table(Attendances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attendances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attendances::ClassId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Attendances::TeacherId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attendances::AttendanceDate)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attendances::AttendanceTime)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attendances::DurationMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Attendances::TotalStudents)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attendances::PresentCount).integer().not_null())
                    .col(ColumnDef::new(Attendances::AbsentCount).integer().not_null())
                    .col(
                        ColumnDef::new(Attendances::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attendances::Table, Attendances::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attendances::Table, Attendances::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建考勤明细表
        manager
            .create_table(
                Table::create()
                    .table(AttendanceDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttendanceDetails::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AttendanceDetails::AttendanceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceDetails::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AttendanceDetails::Status).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(AttendanceDetails::Table, AttendanceDetails::AttendanceId)
                            .to(Attendances::Table, Attendances::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AttendanceDetails::Table, AttendanceDetails::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建考试表
        manager
            .create_table(
                Table::create()
                    .table(Exams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Exams::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Exams::ClassId).big_integer().not_null())
                    .col(ColumnDef::new(Exams::ExamName).string().not_null())
                    .col(ColumnDef::new(Exams::Classroom).string().not_null())
                    .col(ColumnDef::new(Exams::ExamDate).string().not_null())
                    .col(ColumnDef::new(Exams::ExamTime).string().not_null())
                    .col(ColumnDef::new(Exams::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Exams::Table, Exams::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建考试座位表
        manager
            .create_table(
                Table::create()
                    .table(ExamSeating::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExamSeating::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExamSeating::ExamId).big_integer().not_null())
                    .col(
                        ColumnDef::new(ExamSeating::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExamSeating::SeatNumber).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExamSeating::Table, ExamSeating::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExamSeating::Table, ExamSeating::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建反馈表
        manager
            .create_table(
                Table::create()
                    .table(Feedbacks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feedbacks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Feedbacks::TeacherId).big_integer().not_null())
                    .col(ColumnDef::new(Feedbacks::Subject).string().not_null())
                    .col(ColumnDef::new(Feedbacks::Message).text().not_null())
                    .col(ColumnDef::new(Feedbacks::FeedbackType).string().not_null())
                    .col(
                        ColumnDef::new(Feedbacks::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Feedbacks::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Feedbacks::Table, Feedbacks::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建系统统计表
        manager
            .create_table(
                Table::create()
                    .table(SystemStats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SystemStats::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SystemStats::StatDate)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SystemStats::DailyLogins)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SystemStats::AiUsageCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一约束：同一学生不能重复选同一班级
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_classes_unique")
                    .table(StudentClasses::Table)
                    .col(StudentClasses::StudentId)
                    .col(StudentClasses::ClassId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_teacher_classes_unique")
                    .table(TeacherClasses::Table)
                    .col(TeacherClasses::TeacherId)
                    .col(TeacherClasses::ClassId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 唯一约束：同一考试内座位号与学生均不可重复
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_exam_seating_seat_unique")
                    .table(ExamSeating::Table)
                    .col(ExamSeating::ExamId)
                    .col(ExamSeating::SeatNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_exam_seating_student_unique")
                    .table(ExamSeating::Table)
                    .col(ExamSeating::ExamId)
                    .col(ExamSeating::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 常用查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_classes_class_id")
                    .table(StudentClasses::Table)
                    .col(StudentClasses::ClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendances_class_date")
                    .table(Attendances::Table)
                    .col(Attendances::ClassId)
                    .col(Attendances::AttendanceDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_details_attendance_id")
                    .table(AttendanceDetails::Table)
                    .col(AttendanceDetails::AttendanceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_exams_class_date")
                    .table(Exams::Table)
                    .col(Exams::ClassId)
                    .col(Exams::ExamDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_feedbacks_is_read")
                    .table(Feedbacks::Table)
                    .col(Feedbacks::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按依赖关系倒序删除
        manager
            .drop_table(Table::drop().table(SystemStats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Feedbacks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExamSeating::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AttendanceDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attendances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeacherClasses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StudentClasses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StudentPhotos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    PasswordHash,
    FullName,
    Email,
    Phone,
    BirthDate,
    Role,
    IsActive,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Students {
    #[sea_orm(iden = "students")]
    Table,
    Id,
    StudentNumber,
    FirstName,
    LastName,
    Email,
    Phone,
    BirthDate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StudentPhotos {
    #[sea_orm(iden = "student_photos")]
    Table,
    Id,
    StudentId,
    PhotoType,
    PhotoPath,
    EncodingData,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Classes {
    #[sea_orm(iden = "classes")]
    Table,
    Id,
    ClassName,
    ClassCode,
    Description,
    MaxAbsences,
    WeeklySchedule,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StudentClasses {
    #[sea_orm(iden = "student_classes")]
    Table,
    Id,
    StudentId,
    ClassId,
    AbsencesCount,
    EnrolledAt,
}

#[derive(DeriveIden)]
enum TeacherClasses {
    #[sea_orm(iden = "teacher_classes")]
    Table,
    Id,
    TeacherId,
    ClassId,
    AssignedAt,
}

#[derive(DeriveIden)]
enum Attendances {
    #[sea_orm(iden = "attendances")]
    Table,
    Id,
    ClassId,
    TeacherId,
    AttendanceDate,
    AttendanceTime,
    DurationMinutes,
    TotalStudents,
    PresentCount,
    AbsentCount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AttendanceDetails {
    #[sea_orm(iden = "attendance_details")]
    Table,
    Id,
    AttendanceId,
    StudentId,
    Status,
}

#[derive(DeriveIden)]
enum Exams {
    #[sea_orm(iden = "exams")]
    Table,
    Id,
    ClassId,
    ExamName,
    Classroom,
    ExamDate,
    ExamTime,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ExamSeating {
    #[sea_orm(iden = "exam_seating")]
    Table,
    Id,
    ExamId,
    StudentId,
    SeatNumber,
}

#[derive(DeriveIden)]
enum Feedbacks {
    #[sea_orm(iden = "feedbacks")]
    Table,
    Id,
    TeacherId,
    Subject,
    Message,
    FeedbackType,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SystemStats {
    #[sea_orm(iden = "system_stats")]
    Table,
    Id,
    StatDate,
    DailyLogins,
    AiUsageCount,
}
