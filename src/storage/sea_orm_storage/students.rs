//! 学生存储操作

use std::collections::{HashMap, HashSet};

use super::SeaOrmStorage;
use super::users::ensure_active_classes;
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::student_classes::{
    ActiveModel as StudentClassActiveModel, Column as StudentClassColumn,
    Entity as StudentClasses,
};
use crate::entity::student_photos::{
    ActiveModel as StudentPhotoActiveModel, Column as StudentPhotoColumn, Entity as StudentPhotos,
};
use crate::entity::students::{ActiveModel, Column, Entity as Students, Model as StudentModel};
use crate::errors::{AttendifyError, Result};
use crate::models::{
    PaginationInfo,
    common::pagination::normalize_pagination,
    students::{
        entities::{Student, StudentDetail, StudentPhoto},
        requests::{CreateStudentRequest, NewStudentPhoto, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    users::entities::ClassBrief,
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// 批量查询学生的启用班级
async fn load_student_classes<C: ConnectionTrait>(
    db: &C,
    student_ids: &[i64],
) -> Result<HashMap<i64, Vec<ClassBrief>>> {
    let mut map: HashMap<i64, Vec<ClassBrief>> = HashMap::new();
    if student_ids.is_empty() {
        return Ok(map);
    }

    let rows = StudentClasses::find()
        .filter(StudentClassColumn::StudentId.is_in(student_ids.iter().copied()))
        .find_also_related(Classes)
        .filter(ClassColumn::IsActive.eq(true))
        .order_by_asc(ClassColumn::ClassName)
        .all(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("查询学生班级失败: {e}")))?;

    for (enrollment, class) in rows {
        if let Some(class) = class {
            map.entry(enrollment.student_id)
                .or_default()
                .push(class.into_class_brief());
        }
    }
    Ok(map)
}

/// 批量查询学生照片
async fn load_student_photos<C: ConnectionTrait>(
    db: &C,
    student_ids: &[i64],
) -> Result<HashMap<i64, Vec<StudentPhoto>>> {
    let mut map: HashMap<i64, Vec<StudentPhoto>> = HashMap::new();
    if student_ids.is_empty() {
        return Ok(map);
    }

    let rows = StudentPhotos::find()
        .filter(StudentPhotoColumn::StudentId.is_in(student_ids.iter().copied()))
        .order_by_asc(StudentPhotoColumn::Id)
        .all(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("查询学生照片失败: {e}")))?;

    for photo in rows {
        map.entry(photo.student_id)
            .or_default()
            .push(photo.into_student_photo());
    }
    Ok(map)
}

async fn attach_details<C: ConnectionTrait>(
    db: &C,
    models: Vec<StudentModel>,
) -> Result<Vec<StudentDetail>> {
    let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
    let mut classes = load_student_classes(db, &ids).await?;
    let mut photos = load_student_photos(db, &ids).await?;

    Ok(models
        .into_iter()
        .map(|m| StudentDetail {
            classes: classes.remove(&m.id).unwrap_or_default(),
            photos: photos.remove(&m.id).unwrap_or_default(),
            student: m.into_student(),
        })
        .collect())
}

/// 同步学生选课：保留仍在列表中的班级（及其缺勤数），删除其余，补充新增
async fn sync_enrollments<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
    class_ids: &[i64],
    now: i64,
) -> Result<()> {
    ensure_active_classes(db, class_ids).await?;

    let wanted: HashSet<i64> = class_ids.iter().copied().collect();
    let existing: HashSet<i64> = StudentClasses::find()
        .filter(StudentClassColumn::StudentId.eq(student_id))
        .all(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("查询学生选课失败: {e}")))?
        .into_iter()
        .map(|m| m.class_id)
        .collect();

    let removed: Vec<i64> = existing.difference(&wanted).copied().collect();
    if !removed.is_empty() {
        StudentClasses::delete_many()
            .filter(StudentClassColumn::StudentId.eq(student_id))
            .filter(StudentClassColumn::ClassId.is_in(removed))
            .exec(db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("删除学生选课失败: {e}")))?;
    }

    let mut added: Vec<i64> = wanted.difference(&existing).copied().collect();
    added.sort_unstable();
    if !added.is_empty() {
        let models = added.into_iter().map(|class_id| StudentClassActiveModel {
            student_id: Set(student_id),
            class_id: Set(class_id),
            absences_count: Set(0),
            enrolled_at: Set(now),
            ..Default::default()
        });
        StudentClasses::insert_many(models)
            .exec(db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("添加学生选课失败: {e}")))?;
    }

    Ok(())
}

/// 保存照片记录；已有照片保留，新照片追加在后
async fn insert_photos<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
    photos: Vec<NewStudentPhoto>,
    now: i64,
) -> Result<()> {
    if photos.is_empty() {
        return Ok(());
    }
    let photos = photos.into_iter().map(|p| StudentPhotoActiveModel {
        student_id: Set(student_id),
        photo_type: Set(p.photo_type.to_string()),
        photo_path: Set(p.photo_path),
        encoding_data: Set(None),
        created_at: Set(now),
        ..Default::default()
    });
    StudentPhotos::insert_many(photos)
        .exec(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("保存学生照片失败: {e}")))?;
    Ok(())
}

impl SeaOrmStorage {
    /// 创建学生，照片与选课在同一事务中写入
    pub async fn create_student_impl(&self, req: CreateStudentRequest) -> Result<StudentDetail> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        let model = ActiveModel {
            student_number: Set(req.student_number),
            first_name: Set(req.first_name),
            last_name: Set(req.last_name),
            email: Set(req.email),
            phone: Set(req.phone),
            birth_date: Set(req.birth_date),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let student = model
            .insert(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("创建学生失败: {e}")))?;

        insert_photos(&txn, student.id, req.photos, now).await?;

        sync_enrollments(&txn, student.id, &req.class_ids, now).await?;

        let detail = attach_details(&txn, vec![student]).await?.pop().ok_or_else(|| {
            AttendifyError::database_operation("创建学生后无法读取学生信息")
        })?;

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(detail)
    }

    /// 通过 ID 获取学生详情
    pub async fn get_student_by_id_impl(&self, id: i64) -> Result<Option<StudentDetail>> {
        let Some(model) = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询学生失败: {e}")))?
        else {
            return Ok(None);
        };

        Ok(attach_details(&self.db, vec![model]).await?.pop())
    }

    /// 通过学号获取学生
    pub async fn get_student_by_number_impl(&self, student_number: &str) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::StudentNumber.eq(student_number))
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    /// 分页列出学生
    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        let (page, size) = normalize_pagination(query.page, query.size);

        let mut select = Students::find();

        if let Some(is_active) = query.is_active {
            select = select.filter(Column::IsActive.eq(is_active));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::StudentNumber.contains(&escaped))
                    .add(Column::FirstName.contains(&escaped))
                    .add(Column::LastName.contains(&escaped)),
            );
        }

        select = select
            .order_by_asc(Column::FirstName)
            .order_by_asc(Column::LastName);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询学生总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询学生页数失败: {e}")))?;

        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询学生列表失败: {e}")))?;

        Ok(StudentListResponse {
            items: attach_details(&self.db, models).await?,
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 全部启用的学生
    pub async fn list_all_students_impl(&self) -> Result<Vec<StudentDetail>> {
        let models = Students::find()
            .filter(Column::IsActive.eq(true))
            .order_by_asc(Column::StudentNumber)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询学生列表失败: {e}")))?;

        attach_details(&self.db, models).await
    }

    /// 更新学生信息，提供 class_ids 时同步选课
    pub async fn update_student_impl(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<StudentDetail>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = Students::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询学生失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(student_number) = update.student_number {
            model.student_number = Set(student_number);
        }

        if let Some(first_name) = update.first_name {
            model.first_name = Set(first_name);
        }

        if let Some(last_name) = update.last_name {
            model.last_name = Set(last_name);
        }

        if let Some(email) = update.email {
            model.email = Set(Some(email));
        }

        if let Some(phone) = update.phone {
            model.phone = Set(Some(phone));
        }

        if let Some(birth_date) = update.birth_date {
            model.birth_date = Set(Some(birth_date));
        }

        let student = model
            .update(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("更新学生失败: {e}")))?;

        if let Some(class_ids) = update.class_ids {
            sync_enrollments(&txn, id, &class_ids, now).await?;
        }

        insert_photos(&txn, id, update.photos, now).await?;

        let detail = attach_details(&txn, vec![student]).await?.pop();

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(detail)
    }

    /// 启用或停用学生
    pub async fn set_student_active_impl(&self, id: i64, active: bool) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Students::update_many()
            .col_expr(Column::IsActive, sea_orm::sea_query::Expr::value(active))
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("更新学生状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::super::SeaOrmStorage;
    use super::super::test_support::setup_test_storage;
    use crate::models::classes::{requests::NewClass, schedule::WeeklySchedule};
    use crate::models::students::{
        entities::PhotoType,
        requests::{CreateStudentRequest, NewStudentPhoto, UpdateStudentRequest},
    };

    pub async fn seed_class(storage: &SeaOrmStorage, code: &str) -> i64 {
        storage
            .create_class_impl(NewClass {
                class_name: format!("Class {code}"),
                class_code: code.to_string(),
                description: None,
                max_absences: 3,
                schedule: WeeklySchedule::new(),
            })
            .await
            .unwrap()
            .id
    }

    pub fn student(number: &str, class_ids: Vec<i64>) -> CreateStudentRequest {
        CreateStudentRequest {
            student_number: number.to_string(),
            first_name: format!("Name{number}"),
            last_name: "Yilmaz".to_string(),
            email: None,
            phone: None,
            birth_date: None,
            class_ids,
            photos: PhotoType::ALL
                .iter()
                .map(|t| NewStudentPhoto {
                    photo_type: *t,
                    photo_path: format!("/uploads/students/{number}_{t}.jpg"),
                })
                .collect(),
        }
    }

    /// 创建一个班级并选入 n 名学生
    pub async fn seed_class_with_students(
        storage: &SeaOrmStorage,
        code: &str,
        n: usize,
    ) -> (i64, Vec<i64>) {
        let class_id = seed_class(storage, code).await;
        let mut ids = Vec::with_capacity(n);
        for i in 0..n {
            let detail = storage
                .create_student_impl(student(&format!("{code}{i:04}"), vec![class_id]))
                .await
                .unwrap();
            ids.push(detail.student.id);
        }
        (class_id, ids)
    }

    #[tokio::test]
    async fn test_create_student_with_photos_and_classes() {
        let storage = setup_test_storage().await;
        let class_id = seed_class(&storage, "BIO").await;

        let detail = storage
            .create_student_impl(student("2024001", vec![class_id]))
            .await
            .unwrap();
        assert_eq!(detail.photos.len(), 5);
        assert_eq!(detail.classes.len(), 1);
        assert_eq!(detail.photos[0].photo_type, PhotoType::Front);
        assert!(!detail.photos[0].has_encoding);

        let by_number = storage
            .get_student_by_number_impl("2024001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, detail.student.id);
    }

    #[tokio::test]
    async fn test_create_student_rolls_back_on_unknown_class() {
        let storage = setup_test_storage().await;
        let result = storage.create_student_impl(student("2024002", vec![77])).await;
        assert!(result.is_err());
        assert!(
            storage
                .get_student_by_number_impl("2024002")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_syncs_enrollments() {
        let storage = setup_test_storage().await;
        let a = seed_class(&storage, "A").await;
        let b = seed_class(&storage, "B").await;
        let detail = storage
            .create_student_impl(student("2024003", vec![a]))
            .await
            .unwrap();

        let updated = storage
            .update_student_impl(
                detail.student.id,
                UpdateStudentRequest {
                    class_ids: Some(vec![b]),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        let ids: Vec<i64> = updated.classes.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[tokio::test]
    async fn test_update_appends_photos() {
        let storage = setup_test_storage().await;
        let detail = storage
            .create_student_impl(student("2024004", vec![]))
            .await
            .unwrap();

        let updated = storage
            .update_student_impl(
                detail.student.id,
                UpdateStudentRequest {
                    last_name: Some("Demir".into()),
                    photos: vec![NewStudentPhoto {
                        photo_type: PhotoType::Front,
                        photo_path: "/uploads/students/new_front.jpg".into(),
                    }],
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.student.last_name, "Demir");
        assert_eq!(updated.photos.len(), 6);
        assert!(
            updated
                .photos
                .iter()
                .any(|p| p.photo_path == "/uploads/students/new_front.jpg")
        );
    }

    #[tokio::test]
    async fn test_update_missing_student_writes_no_photos() {
        let storage = setup_test_storage().await;
        let result = storage
            .update_student_impl(
                999,
                UpdateStudentRequest {
                    photos: vec![NewStudentPhoto {
                        photo_type: PhotoType::Front,
                        photo_path: "/uploads/students/ghost.jpg".into(),
                    }],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
