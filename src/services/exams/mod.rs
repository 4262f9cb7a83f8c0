pub mod create;
pub mod delete;
pub mod detail;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::exams::requests::{CreateExamRequest, ExamListParams};
use crate::storage::Storage;

pub struct ExamService {
    storage: Option<Arc<dyn Storage>>,
}

impl ExamService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 创建考试并随机分配座位
    pub async fn create_exam(
        &self,
        request: &HttpRequest,
        exam_data: CreateExamRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_exam(self, request, exam_data).await
    }

    pub async fn get_exam(&self, request: &HttpRequest, exam_id: i64) -> ActixResult<HttpResponse> {
        detail::get_exam(self, request, exam_id).await
    }

    // 教师查看自己班级的考试座位表
    pub async fn get_teacher_exam(
        &self,
        request: &HttpRequest,
        exam_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_teacher_exam(self, request, exam_id).await
    }

    pub async fn list_exams(
        &self,
        request: &HttpRequest,
        query: ExamListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_exams(self, request, query).await
    }

    pub async fn list_teacher_exams(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_teacher_exams(self, request).await
    }

    pub async fn delete_exam(&self, request: &HttpRequest, exam_id: i64) -> ActixResult<HttpResponse> {
        delete::delete_exam(self, request, exam_id).await
    }
}
