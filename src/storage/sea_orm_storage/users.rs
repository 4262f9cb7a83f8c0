//! 用户存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::teacher_classes::{
    ActiveModel as TeacherClassActiveModel, Column as TeacherClassColumn,
    Entity as TeacherClasses,
};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{AttendifyError, Result};
use crate::models::{
    PaginationInfo,
    common::pagination::normalize_pagination,
    users::{
        entities::{ClassBrief, TeacherWithClasses, User, UserRole},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::TeacherListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// 确认所有班级存在且处于启用状态
pub(super) async fn ensure_active_classes<C: ConnectionTrait>(
    db: &C,
    class_ids: &[i64],
) -> Result<()> {
    if class_ids.is_empty() {
        return Ok(());
    }

    let found = Classes::find()
        .filter(ClassColumn::Id.is_in(class_ids.iter().copied()))
        .filter(ClassColumn::IsActive.eq(true))
        .count(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?;

    let mut distinct = class_ids.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if found as usize != distinct.len() {
        return Err(AttendifyError::not_found(
            "One or more classes do not exist or are inactive",
        ));
    }
    Ok(())
}

/// 替换教师的授课班级
async fn replace_teacher_classes<C: ConnectionTrait>(
    db: &C,
    teacher_id: i64,
    class_ids: &[i64],
    now: i64,
) -> Result<()> {
    ensure_active_classes(db, class_ids).await?;

    TeacherClasses::delete_many()
        .filter(TeacherClassColumn::TeacherId.eq(teacher_id))
        .exec(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("清除授课班级失败: {e}")))?;

    let mut distinct = class_ids.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.is_empty() {
        return Ok(());
    }

    let models = distinct.into_iter().map(|class_id| TeacherClassActiveModel {
        teacher_id: Set(teacher_id),
        class_id: Set(class_id),
        assigned_at: Set(now),
        ..Default::default()
    });
    TeacherClasses::insert_many(models)
        .exec(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("分配授课班级失败: {e}")))?;

    Ok(())
}

/// 批量查询教师负责的班级
pub(super) async fn load_teacher_classes<C: ConnectionTrait>(
    db: &C,
    teacher_ids: &[i64],
) -> Result<HashMap<i64, Vec<ClassBrief>>> {
    let mut map: HashMap<i64, Vec<ClassBrief>> = HashMap::new();
    if teacher_ids.is_empty() {
        return Ok(map);
    }

    let rows = TeacherClasses::find()
        .filter(TeacherClassColumn::TeacherId.is_in(teacher_ids.iter().copied()))
        .find_also_related(Classes)
        .filter(ClassColumn::IsActive.eq(true))
        .order_by_asc(ClassColumn::ClassName)
        .all(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("查询授课班级失败: {e}")))?;

    for (assignment, class) in rows {
        if let Some(class) = class {
            map.entry(assignment.teacher_id)
                .or_default()
                .push(class.into_class_brief());
        }
    }
    Ok(map)
}

fn attach_classes(
    users: Vec<User>,
    mut classes: HashMap<i64, Vec<ClassBrief>>,
) -> Vec<TeacherWithClasses> {
    users
        .into_iter()
        .map(|user| TeacherWithClasses {
            classes: classes.remove(&user.id).unwrap_or_default(),
            user,
        })
        .collect()
}

impl SeaOrmStorage {
    /// 创建用户，教师的授课班级在同一事务中写入
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        let model = ActiveModel {
            username: Set(req.username),
            password_hash: Set(req.password),
            full_name: Set(req.full_name),
            email: Set(req.email),
            phone: Set(req.phone),
            birth_date: Set(req.birth_date),
            role: Set(req.role.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("创建用户失败: {e}")))?;

        if !req.class_ids.is_empty() {
            replace_teacher_classes(&txn, result.id, &req.class_ids, now).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 分页列出教师
    pub async fn list_teachers_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<TeacherListResponse> {
        let (page, size) = normalize_pagination(query.page, query.size);

        let role = query.role.unwrap_or(UserRole::Teacher);
        let mut select = Users::find().filter(Column::Role.eq(role.to_string()));

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Username.contains(&escaped))
                    .add(Column::Email.contains(&escaped))
                    .add(Column::FullName.contains(&escaped)),
            );
        }

        // 状态筛选
        if let Some(is_active) = query.is_active {
            select = select.filter(Column::IsActive.eq(is_active));
        }

        select = select.order_by_asc(Column::FullName);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询教师总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询教师页数失败: {e}")))?;

        let users: Vec<User> = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询教师列表失败: {e}")))?
            .into_iter()
            .map(|m| m.into_user())
            .collect();

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let classes = load_teacher_classes(&self.db, &ids).await?;

        Ok(TeacherListResponse {
            items: attach_classes(users, classes),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 获取教师及其班级
    pub async fn get_teacher_with_classes_impl(
        &self,
        id: i64,
    ) -> Result<Option<TeacherWithClasses>> {
        let Some(user) = self.get_user_by_id_impl(id).await? else {
            return Ok(None);
        };
        if user.role != UserRole::Teacher {
            return Ok(None);
        }

        let classes = load_teacher_classes(&self.db, &[id]).await?;
        Ok(attach_classes(vec![user], classes).pop())
    }

    /// 全部启用的教师
    pub async fn list_all_teachers_impl(&self) -> Result<Vec<TeacherWithClasses>> {
        let users: Vec<User> = Users::find()
            .filter(Column::Role.eq(UserRole::TEACHER))
            .filter(Column::IsActive.eq(true))
            .order_by_asc(Column::FullName)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询教师列表失败: {e}")))?
            .into_iter()
            .map(|m| m.into_user())
            .collect();

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let classes = load_teacher_classes(&self.db, &ids).await?;
        Ok(attach_classes(users, classes))
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                AttendifyError::database_operation(format!("更新最后登录时间失败: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    /// 管理员数量（启动时决定是否创建默认管理员）
    pub async fn count_admins_impl(&self) -> Result<u64> {
        Users::find()
            .filter(Column::Role.eq(UserRole::ADMIN))
            .count(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("统计管理员失败: {e}")))
    }

    /// 更新用户信息，提供 class_ids 时同时替换授课班级
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = Users::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询用户失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(full_name) = update.full_name {
            model.full_name = Set(full_name);
        }

        if let Some(email) = update.email {
            model.email = Set(email);
        }

        if let Some(phone) = update.phone {
            model.phone = Set(Some(phone));
        }

        if let Some(birth_date) = update.birth_date {
            model.birth_date = Set(Some(birth_date));
        }

        if let Some(password) = update.password {
            model.password_hash = Set(password);
        }

        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        let result = model
            .update(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("更新用户失败: {e}")))?;

        if let Some(class_ids) = update.class_ids {
            replace_teacher_classes(&txn, id, &class_ids, now).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(result.into_user()))
    }

    /// 启用或停用用户
    pub async fn set_user_active_impl(&self, id: i64, active: bool) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::IsActive, sea_orm::sea_query::Expr::value(active))
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("更新用户状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_storage;
    use crate::models::classes::{requests::NewClass, schedule::WeeklySchedule};
    use crate::models::users::{
        entities::UserRole,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
    };

    fn new_class(code: &str) -> NewClass {
        NewClass {
            class_name: format!("Class {code}"),
            class_code: code.to_string(),
            description: None,
            max_absences: 3,
            schedule: WeeklySchedule::new(),
        }
    }

    fn teacher(username: &str, class_ids: Vec<i64>) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "hash".to_string(),
            full_name: format!("Teacher {username}"),
            email: format!("{username}@school.test"),
            phone: None,
            birth_date: None,
            role: UserRole::Teacher,
            class_ids,
        }
    }

    #[tokio::test]
    async fn test_create_teacher_with_classes() {
        let storage = setup_test_storage().await;
        let math = storage.create_class_impl(new_class("MAT")).await.unwrap();
        let phys = storage.create_class_impl(new_class("PHY")).await.unwrap();

        let user = storage
            .create_user_impl(teacher("ayse", vec![math.id, phys.id]))
            .await
            .unwrap();

        let detail = storage
            .get_teacher_with_classes_impl(user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.classes.len(), 2);
        assert!(storage.is_teacher_of_class_impl(user.id, math.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_class_rolls_back_teacher() {
        let storage = setup_test_storage().await;
        let result = storage.create_user_impl(teacher("mehmet", vec![999])).await;
        assert!(result.is_err());
        assert!(
            storage
                .get_user_by_username_impl("mehmet")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_replaces_classes_and_deactivates() {
        let storage = setup_test_storage().await;
        let math = storage.create_class_impl(new_class("MAT")).await.unwrap();
        let phys = storage.create_class_impl(new_class("PHY")).await.unwrap();
        let user = storage
            .create_user_impl(teacher("zeynep", vec![math.id]))
            .await
            .unwrap();

        let updated = storage
            .update_user_impl(
                user.id,
                UpdateUserRequest {
                    full_name: Some("Zeynep K.".into()),
                    class_ids: Some(vec![phys.id]),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.full_name, "Zeynep K.");
        assert_eq!(
            storage.list_teacher_class_ids_impl(user.id).await.unwrap(),
            vec![phys.id]
        );

        assert!(storage.set_user_active_impl(user.id, false).await.unwrap());
        let active = storage
            .list_teachers_with_pagination_impl(UserListQuery {
                is_active: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.pagination.total, 0);
    }
}
