pub mod detail;
pub mod list;
pub mod recognized;
pub mod stats;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::attendances::requests::{
    AttendanceListParams, AttendanceStatsParams, RecognizedAttendanceRequest,
    SubmitAttendanceRequest,
};
use crate::storage::Storage;

pub struct AttendanceService {
    storage: Option<Arc<dyn Storage>>,
}

impl AttendanceService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 教师提交点名
    pub async fn submit_attendance(
        &self,
        request: &HttpRequest,
        attendance: SubmitAttendanceRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit_attendance(self, request, attendance).await
    }

    // 将人脸识别结果映射到班级名单
    pub async fn recognized_attendance(
        &self,
        request: &HttpRequest,
        recognized: RecognizedAttendanceRequest,
    ) -> ActixResult<HttpResponse> {
        recognized::recognized_attendance(self, request, recognized).await
    }

    pub async fn list_teacher_attendances(
        &self,
        request: &HttpRequest,
        query: AttendanceListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_teacher_attendances(self, request, query).await
    }

    // 最近一个月的全部点名记录
    pub async fn list_attendances(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_attendances(self, request).await
    }

    pub async fn get_attendance(
        &self,
        request: &HttpRequest,
        attendance_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_attendance(self, request, attendance_id).await
    }

    pub async fn get_stats(
        &self,
        request: &HttpRequest,
        query: AttendanceStatsParams,
    ) -> ActixResult<HttpResponse> {
        stats::get_stats(self, request, query).await
    }
}
