//! 教师授课相关查询

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};

use super::SeaOrmStorage;
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::student_classes::{Column as StudentClassColumn, Entity as StudentClasses};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::entity::teacher_classes::{Column, Entity as TeacherClasses};
use crate::errors::{AttendifyError, Result};
use crate::models::{
    classes::entities::ClassDetail,
    students::entities::{EnrollmentInfo, TeacherStudent},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

impl SeaOrmStorage {
    /// 教师是否负责该班级
    pub async fn is_teacher_of_class_impl(&self, teacher_id: i64, class_id: i64) -> Result<bool> {
        let count = TeacherClasses::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .filter(Column::ClassId.eq(class_id))
            .count(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询授课关系失败: {e}")))?;

        Ok(count > 0)
    }

    /// 教师负责的启用班级 ID（升序）
    pub async fn list_teacher_class_ids_impl(&self, teacher_id: i64) -> Result<Vec<i64>> {
        let rows = TeacherClasses::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .find_also_related(Classes)
            .filter(ClassColumn::IsActive.eq(true))
            .order_by_asc(Column::ClassId)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询授课班级失败: {e}")))?;

        Ok(rows
            .into_iter()
            .filter(|(_, class)| class.is_some())
            .map(|(assignment, _)| assignment.class_id)
            .collect())
    }

    /// 教师的班级及学生
    pub async fn list_teacher_classes_impl(
        &self,
        teacher_id: i64,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<Vec<ClassDetail>> {
        let class_ids = self.list_teacher_class_ids_impl(teacher_id).await?;
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = Classes::find()
            .filter(ClassColumn::Id.is_in(class_ids))
            .order_by_asc(ClassColumn::ClassName)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?;

        let mut details = Vec::with_capacity(models.len());
        for model in models {
            details.push(self.build_class_detail(model, now, makeup_ttl).await?);
        }
        Ok(details)
    }

    /// 教师的学生，按学生去重并附带各班缺勤信息，按名字排序
    pub async fn list_teacher_students_impl(&self, teacher_id: i64) -> Result<Vec<TeacherStudent>> {
        let class_ids = self.list_teacher_class_ids_impl(teacher_id).await?;
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let classes: BTreeMap<i64, _> = Classes::find()
            .filter(ClassColumn::Id.is_in(class_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let rows = StudentClasses::find()
            .filter(StudentClassColumn::ClassId.is_in(class_ids))
            .find_also_related(Students)
            .filter(StudentColumn::IsActive.eq(true))
            .order_by_asc(StudentColumn::FirstName)
            .order_by_asc(StudentColumn::LastName)
            .order_by_asc(StudentClassColumn::ClassId)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询学生失败: {e}")))?;

        let mut order: Vec<i64> = Vec::new();
        let mut students: BTreeMap<i64, TeacherStudent> = BTreeMap::new();
        for (enrollment, student) in rows {
            let (Some(student), Some(class)) = (student, classes.get(&enrollment.class_id)) else {
                continue;
            };
            let entry = students.entry(student.id).or_insert_with(|| {
                order.push(student.id);
                TeacherStudent {
                    student: student.into_student(),
                    enrollments: Vec::new(),
                }
            });
            entry.enrollments.push(EnrollmentInfo::new(
                class.id,
                class.class_name.clone(),
                class.class_code.clone(),
                enrollment.absences_count,
                class.max_absences,
            ));
        }

        Ok(order
            .into_iter()
            .filter_map(|id| students.remove(&id))
            .collect())
    }

    /// 教师的班级数与（去重后的）学生数
    pub async fn count_teacher_classes_and_students_impl(
        &self,
        teacher_id: i64,
    ) -> Result<(i64, i64)> {
        let class_ids = self.list_teacher_class_ids_impl(teacher_id).await?;
        if class_ids.is_empty() {
            return Ok((0, 0));
        }
        let class_count = class_ids.len() as i64;

        let rows = StudentClasses::find()
            .filter(StudentClassColumn::ClassId.is_in(class_ids))
            .find_also_related(Students)
            .filter(StudentColumn::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("统计学生失败: {e}")))?;

        let distinct: HashSet<i64> = rows
            .into_iter()
            .filter(|(_, student)| student.is_some())
            .map(|(enrollment, _)| enrollment.student_id)
            .collect();

        Ok((class_count, distinct.len() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::super::students::tests::{seed_class, student};
    use super::super::test_support::setup_test_storage;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use chrono::{TimeDelta, Utc};

    #[tokio::test]
    async fn test_teacher_students_are_deduplicated() {
        let storage = setup_test_storage().await;
        let a = seed_class(&storage, "A").await;
        let b = seed_class(&storage, "B").await;
        let other = seed_class(&storage, "C").await;

        storage
            .create_student_impl(student("S1", vec![a, b]))
            .await
            .unwrap();
        storage
            .create_student_impl(student("S2", vec![b]))
            .await
            .unwrap();
        storage
            .create_student_impl(student("S3", vec![other]))
            .await
            .unwrap();

        let teacher = storage
            .create_user_impl(CreateUserRequest {
                username: "hoca".into(),
                password: "hash".into(),
                full_name: "Hoca".into(),
                email: "hoca@school.test".into(),
                phone: None,
                birth_date: None,
                role: UserRole::Teacher,
                class_ids: vec![a, b],
            })
            .await
            .unwrap();

        let students = storage.list_teacher_students_impl(teacher.id).await.unwrap();
        assert_eq!(students.len(), 2);
        let s1 = students
            .iter()
            .find(|s| s.student.student_number == "S1")
            .unwrap();
        assert_eq!(s1.enrollments.len(), 2);
        assert_eq!(s1.enrollments[0].remaining_absences, 3);

        assert_eq!(
            storage
                .count_teacher_classes_and_students_impl(teacher.id)
                .await
                .unwrap(),
            (2, 2)
        );

        let classes = storage
            .list_teacher_classes_impl(teacher.id, Utc::now(), TimeDelta::days(7))
            .await
            .unwrap();
        assert_eq!(classes.len(), 2);
        assert!(!storage.is_teacher_of_class_impl(teacher.id, other).await.unwrap());
    }
}
