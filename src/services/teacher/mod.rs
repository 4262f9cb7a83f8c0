//! 教师自助：个人资料、我的班级、我的学生

pub mod classes;
pub mod profile;
pub mod students;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::classes::requests::ScheduleOptions;
use crate::models::users::requests::UpdateProfileRequest;
use crate::storage::Storage;

pub struct TeacherPortalService {
    storage: Option<Arc<dyn Storage>>,
}

impl TeacherPortalService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub(crate) fn makeup_ttl(&self) -> chrono::TimeDelta {
        ScheduleOptions::from_config(&AppConfig::get().schedule).makeup_ttl
    }

    pub async fn get_profile(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        profile::get_profile(self, request).await
    }

    pub async fn update_profile(
        &self,
        request: &HttpRequest,
        update: UpdateProfileRequest,
    ) -> ActixResult<HttpResponse> {
        profile::update_profile(self, request, update).await
    }

    pub async fn list_my_classes(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        classes::list_my_classes(self, request).await
    }

    pub async fn get_my_class(&self, request: &HttpRequest, class_id: i64) -> ActixResult<HttpResponse> {
        classes::get_my_class(self, request, class_id).await
    }

    pub async fn list_my_students(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        students::list_my_students(self, request).await
    }
}
