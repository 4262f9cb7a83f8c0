use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Local;

use super::AttendanceService;
use crate::models::ApiResponse;
use crate::models::attendances::{
    requests::{DEFAULT_DURATION_MINUTES, NewAttendance, SubmitAttendanceRequest},
    responses::AttendanceSubmittedResponse,
};
use crate::services::{bad_request, current_user, ensure_class_access, error_response};
use crate::try_response;

/// 单次课程时长上限（分钟）
const MAX_DURATION_MINUTES: i32 = 600;

pub(crate) fn validate_duration(duration: Option<i32>) -> Result<i32, String> {
    let duration = duration.unwrap_or(DEFAULT_DURATION_MINUTES);
    if !(1..=MAX_DURATION_MINUTES).contains(&duration) {
        return Err(format!(
            "duration_minutes must be between 1 and {MAX_DURATION_MINUTES}"
        ));
    }
    Ok(duration)
}

pub async fn submit_attendance(
    service: &AttendanceService,
    request: &HttpRequest,
    attendance: SubmitAttendanceRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    if attendance.students.is_empty() {
        return Ok(bad_request("At least one student is required"));
    }
    let duration = try_response!(validate_duration(attendance.duration_minutes).map_err(bad_request));
    try_response!(ensure_class_access(&storage, &user, attendance.class_id).await);

    let now = Local::now();
    let new_attendance = NewAttendance {
        class_id: attendance.class_id,
        teacher_id: user.id,
        attendance_date: now.format("%Y-%m-%d").to_string(),
        attendance_time: now.format("%H:%M:%S").to_string(),
        duration_minutes: duration,
        records: attendance.students,
    };

    match storage.submit_attendance(new_attendance).await {
        Ok(saved) => {
            let response = AttendanceSubmittedResponse {
                attendance_id: saved.id,
                present_count: saved.present_count,
                absent_count: saved.absent_count,
            };
            Ok(HttpResponse::Created().json(ApiResponse::success(
                response,
                "Attendance submitted successfully",
            )))
        }
        Err(e) => Ok(error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_duration() {
        assert_eq!(validate_duration(None).unwrap(), 45);
        assert_eq!(validate_duration(Some(90)).unwrap(), 90);
        assert!(validate_duration(Some(0)).is_err());
        assert!(validate_duration(Some(601)).is_err());
    }
}
