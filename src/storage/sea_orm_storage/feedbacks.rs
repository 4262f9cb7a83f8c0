//! 反馈存储操作

use chrono::{DateTime, Utc};

use super::SeaOrmStorage;
use crate::entity::feedbacks::{ActiveModel, Column, Entity as Feedbacks, Model};
use crate::entity::users::{Entity as Users, Model as UserModel};
use crate::errors::{AttendifyError, Result};
use crate::models::feedbacks::{
    entities::{Feedback, FeedbackWithTeacher},
    requests::NewFeedback,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

fn with_teacher((feedback, teacher): (Model, Option<UserModel>)) -> FeedbackWithTeacher {
    let (teacher_name, teacher_email) = teacher
        .map(|t| (t.full_name, t.email))
        .unwrap_or_default();
    FeedbackWithTeacher {
        feedback: feedback.into_feedback(),
        teacher_name,
        teacher_email,
    }
}

impl SeaOrmStorage {
    pub async fn create_feedback_impl(&self, req: NewFeedback) -> Result<Feedback> {
        let model = ActiveModel {
            teacher_id: Set(req.teacher_id),
            subject: Set(req.subject),
            message: Set(req.message),
            feedback_type: Set(req.feedback_type.as_str().to_string()),
            is_read: Set(false),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("保存反馈失败: {e}")))?;

        Ok(model.into_feedback())
    }

    /// 教师自己发送的反馈（新到旧）
    pub async fn list_teacher_feedbacks_impl(
        &self,
        teacher_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Feedback>> {
        let models = Feedbacks::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .filter(Column::CreatedAt.gte(since.timestamp()))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询反馈失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_feedback()).collect())
    }

    /// 未读反馈（新到旧）
    pub async fn list_unread_feedbacks_impl(
        &self,
        limit: Option<u64>,
    ) -> Result<Vec<FeedbackWithTeacher>> {
        let mut select = Feedbacks::find()
            .filter(Column::IsRead.eq(false))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);
        if let Some(limit) = limit {
            select = select.limit(limit);
        }

        let rows = select
            .find_also_related(Users)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询未读反馈失败: {e}")))?;

        Ok(rows.into_iter().map(with_teacher).collect())
    }

    /// 指定时间之后的所有反馈（新到旧）
    pub async fn list_recent_feedbacks_impl(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<FeedbackWithTeacher>> {
        let rows = Feedbacks::find()
            .filter(Column::CreatedAt.gte(since.timestamp()))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .find_also_related(Users)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询反馈失败: {e}")))?;

        Ok(rows.into_iter().map(with_teacher).collect())
    }

    pub async fn mark_feedback_read_impl(&self, feedback_id: i64) -> Result<bool> {
        let result = Feedbacks::update_many()
            .col_expr(Column::IsRead, sea_orm::sea_query::Expr::value(true))
            .filter(Column::Id.eq(feedback_id))
            .exec(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("更新反馈状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_storage;
    use crate::models::feedbacks::{entities::FeedbackType, requests::NewFeedback};
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use chrono::{TimeDelta, Utc};

    #[tokio::test]
    async fn test_feedback_lifecycle() {
        let storage = setup_test_storage().await;
        let teacher = storage
            .create_user_impl(CreateUserRequest {
                username: "mehmet".into(),
                password: "hash".into(),
                full_name: "Mehmet Hoca".into(),
                email: "mehmet@school.test".into(),
                phone: None,
                birth_date: None,
                role: UserRole::Teacher,
                class_ids: vec![],
            })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for (subject, kind) in [
            ("Projector", FeedbackType::Complaint),
            ("Chalk", FeedbackType::Request),
        ] {
            let feedback = storage
                .create_feedback_impl(NewFeedback {
                    teacher_id: teacher.id,
                    subject: subject.into(),
                    message: "Please check".into(),
                    feedback_type: kind,
                })
                .await
                .unwrap();
            assert!(!feedback.is_read);
            ids.push(feedback.id);
        }

        let since = Utc::now() - TimeDelta::days(30);
        assert_eq!(
            storage
                .list_teacher_feedbacks_impl(teacher.id, since)
                .await
                .unwrap()
                .len(),
            2
        );

        let unread = storage.list_unread_feedbacks_impl(Some(1)).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].teacher_name, "Mehmet Hoca");

        assert!(storage.mark_feedback_read_impl(ids[0]).await.unwrap());
        assert!(!storage.mark_feedback_read_impl(9999).await.unwrap());

        let unread = storage.list_unread_feedbacks_impl(None).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].feedback.id, ids[1]);

        let recent = storage.list_recent_feedbacks_impl(since).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(
            storage
                .list_recent_feedbacks_impl(Utc::now() + TimeDelta::hours(1))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
