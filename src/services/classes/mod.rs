pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod lock;
pub mod schedule;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::classes::requests::{
    AvailabilityQuery, ClassQueryParams, CreateClassRequest, MakeupRequest, ScheduleOptions,
    SlotCell, UpdateClassRequest,
};
use crate::storage::Storage;
use lock::ScheduleLocks;

pub struct ClassService {
    storage: Option<Arc<dyn Storage>>,
    locks: ScheduleLocks,
}

impl ClassService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            locks: ScheduleLocks::new(),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub(crate) fn schedule_options(&self) -> ScheduleOptions {
        ScheduleOptions::from_config(&AppConfig::get().schedule)
    }

    pub(crate) fn locks(&self) -> &ScheduleLocks {
        &self.locks
    }

    // 获取班级列表（先清理过期补课）
    pub async fn list_classes(
        &self,
        request: &HttpRequest,
        query: ClassQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::list_classes(self, request, query).await
    }

    pub async fn create_class(
        &self,
        request: &HttpRequest,
        class_data: CreateClassRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_class(self, request, class_data).await
    }

    // 班级详情（教师与学生）
    pub async fn get_class(&self, request: &HttpRequest, class_id: i64) -> ActixResult<HttpResponse> {
        get::get_class(self, request, class_id).await
    }

    pub async fn update_class(
        &self,
        request: &HttpRequest,
        class_id: i64,
        update_data: UpdateClassRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_class(self, request, class_id, update_data).await
    }

    // 停用班级
    pub async fn delete_class(&self, request: &HttpRequest, class_id: i64) -> ActixResult<HttpResponse> {
        delete::delete_class(self, request, class_id).await
    }

    pub async fn get_schedule(&self, request: &HttpRequest, class_id: i64) -> ActixResult<HttpResponse> {
        schedule::get_schedule(self, request, class_id).await
    }

    // 多个班级的合并空闲时段
    pub async fn availability(
        &self,
        request: &HttpRequest,
        query: AvailabilityQuery,
    ) -> ActixResult<HttpResponse> {
        schedule::availability(self, request, query).await
    }

    // 跨班级补课预约
    pub async fn book_makeup(
        &self,
        request: &HttpRequest,
        makeup: MakeupRequest,
    ) -> ActixResult<HttpResponse> {
        schedule::book_makeup(self, request, makeup).await
    }

    pub async fn add_slot(
        &self,
        request: &HttpRequest,
        class_id: i64,
        cell: SlotCell,
    ) -> ActixResult<HttpResponse> {
        schedule::add_slot(self, request, class_id, cell).await
    }

    pub async fn remove_slot(
        &self,
        request: &HttpRequest,
        class_id: i64,
        cell: SlotCell,
    ) -> ActixResult<HttpResponse> {
        schedule::remove_slot(self, request, class_id, cell).await
    }
}
