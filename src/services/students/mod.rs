pub mod create;
pub mod fields;
pub mod get;
pub mod list;
pub mod photos;
pub mod status;
pub mod update;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::students::requests::{StudentListParams, UpdateStudentRequest};
use crate::storage::Storage;

pub struct StudentService {
    storage: Option<Arc<dyn Storage>>,
}

impl StudentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub async fn list_students(
        &self,
        request: &HttpRequest,
        query: StudentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_students(self, request, query).await
    }

    pub async fn get_student(&self, request: &HttpRequest, student_id: i64) -> ActixResult<HttpResponse> {
        get::get_student(self, request, student_id).await
    }

    // 创建学生（multipart，含 5 张照片）
    pub async fn create_student(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        create::create_student(self, request, payload).await
    }

    pub async fn update_student(
        &self,
        request: &HttpRequest,
        student_id: i64,
        update: UpdateStudentRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_student(self, request, student_id, update).await
    }

    // multipart 更新，可追加照片
    pub async fn update_student_multipart(
        &self,
        request: &HttpRequest,
        student_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        update::update_student_multipart(self, request, student_id, payload).await
    }

    // 启用或停用学生
    pub async fn set_active(
        &self,
        request: &HttpRequest,
        student_id: i64,
        active: bool,
    ) -> ActixResult<HttpResponse> {
        status::set_active(self, request, student_id, active).await
    }
}
