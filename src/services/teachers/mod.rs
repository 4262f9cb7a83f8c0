//! 管理员维护教师账号

pub mod create;
pub mod fields;
pub mod get;
pub mod list;
pub mod status;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::users::requests::{CreateTeacherRequest, TeacherListParams, UpdateTeacherRequest};
use crate::storage::Storage;

pub struct TeacherService {
    storage: Option<Arc<dyn Storage>>,
}

impl TeacherService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub async fn list_teachers(
        &self,
        request: &HttpRequest,
        query: TeacherListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_teachers(self, request, query).await
    }

    pub async fn get_teacher(&self, request: &HttpRequest, teacher_id: i64) -> ActixResult<HttpResponse> {
        get::get_teacher(self, request, teacher_id).await
    }

    pub async fn create_teacher(
        &self,
        request: &HttpRequest,
        teacher: CreateTeacherRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_teacher(self, request, teacher).await
    }

    pub async fn update_teacher(
        &self,
        request: &HttpRequest,
        teacher_id: i64,
        update: UpdateTeacherRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_teacher(self, request, teacher_id, update).await
    }

    pub async fn set_active(
        &self,
        request: &HttpRequest,
        teacher_id: i64,
        active: bool,
    ) -> ActixResult<HttpResponse> {
        status::set_active(self, request, teacher_id, active).await
    }
}
