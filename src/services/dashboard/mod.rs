pub mod export;
pub mod overview;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::dashboard::requests::ExportParams;
use crate::storage::Storage;

pub struct DashboardService {
    storage: Option<Arc<dyn Storage>>,
}

impl DashboardService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 管理员仪表盘
    pub async fn get_dashboard(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        overview::get_dashboard(self, request).await
    }

    // 导出学生、教师或班级列表
    pub async fn export(&self, request: &HttpRequest, params: ExportParams) -> ActixResult<HttpResponse> {
        export::export(self, request, params).await
    }
}
