use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{Local, NaiveDate, TimeDelta};

use super::AttendanceService;
use crate::models::ApiResponse;
use crate::models::attendances::{
    requests::AttendanceListParams, responses::AttendanceListResponse,
};
use crate::services::{current_user, error_response};
use crate::try_response;

/// 教师点名记录默认查询天数
const DEFAULT_DAYS: i64 = 30;
const MAX_DAYS: i64 = 365;

/// 最近 days 天（含今天）的起始日期
pub(crate) fn since_days(today: NaiveDate, days: Option<i64>) -> NaiveDate {
    let days = days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS);
    today - TimeDelta::days(days - 1)
}

pub async fn list_teacher_attendances(
    service: &AttendanceService,
    request: &HttpRequest,
    query: AttendanceListParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    let since = since_days(Local::now().date_naive(), query.days);

    match storage.list_attendances(Some(user.id), None, since).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AttendanceListResponse { items },
            "Attendance list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}

pub async fn list_attendances(
    service: &AttendanceService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let since = since_days(Local::now().date_naive(), None);

    match storage.list_attendances(None, None, since).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AttendanceListResponse { items },
            "Attendance list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_days() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(since_days(today, None), NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(since_days(today, Some(1)), today);
        assert_eq!(since_days(today, Some(-5)), today);
        assert_eq!(
            since_days(today, Some(10_000)),
            today - TimeDelta::days(364)
        );
    }
}
