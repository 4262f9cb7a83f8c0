use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{Local, NaiveDate, TimeDelta};

use super::AttendanceService;
use crate::models::ApiResponse;
use crate::models::attendances::requests::AttendanceStatsParams;
use crate::services::{bad_request, error_response};
use crate::try_response;
use crate::utils::validate::parse_date;

/// 统计区间，默认最近 30 天
pub(crate) fn stats_range(
    query: &AttendanceStatsParams,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), String> {
    let end = match query.end_date.as_deref() {
        Some(raw) => parse_date(raw, "end_date")?,
        None => today,
    };
    let start = match query.start_date.as_deref() {
        Some(raw) => parse_date(raw, "start_date")?,
        None => end - TimeDelta::days(29),
    };
    if start > end {
        return Err("start_date must not be after end_date".to_string());
    }
    Ok((start, end))
}

pub async fn get_stats(
    service: &AttendanceService,
    request: &HttpRequest,
    query: AttendanceStatsParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let (start, end) =
        try_response!(stats_range(&query, Local::now().date_naive()).map_err(bad_request));

    match storage.get_attendance_stats(start, end).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            stats,
            "Attendance statistics retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(start: Option<&str>, end: Option<&str>) -> AttendanceStatsParams {
        AttendanceStatsParams {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn test_stats_range() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        assert_eq!(
            stats_range(&params(None, None), today).unwrap(),
            (NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), today)
        );
        assert_eq!(
            stats_range(&params(Some("2025-01-01"), Some("2025-01-31")), today).unwrap().1,
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert!(stats_range(&params(Some("2025-02-01"), Some("2025-01-31")), today).is_err());
        assert!(stats_range(&params(Some("01/02/2025"), None), today).is_err());
    }
}
