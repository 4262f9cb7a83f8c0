//! 人脸识别结果
//!
//! 识别服务只返回学号列表，这里将其映射为班级名单上每名学生的出勤状态，
//! 由教师确认后再通过普通点名接口提交。

use std::collections::HashSet;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Local;
use tracing::warn;

use super::AttendanceService;
use crate::models::ApiResponse;
use crate::models::attendances::{
    entities::AttendanceStatus,
    requests::RecognizedAttendanceRequest,
    responses::{RecognizedAttendanceResponse, RecognizedStudent},
};
use crate::models::classes::entities::ClassStudent;
use crate::services::{current_user, ensure_class_access, error_response};
use crate::try_response;

pub(crate) fn match_roster(
    class_id: i64,
    roster: Vec<ClassStudent>,
    student_numbers: &[String],
) -> RecognizedAttendanceResponse {
    let recognized: HashSet<&str> = student_numbers
        .iter()
        .map(|number| number.trim())
        .filter(|number| !number.is_empty())
        .collect();

    let students: Vec<RecognizedStudent> = roster
        .into_iter()
        .map(|student| {
            let status = if recognized.contains(student.student_number.as_str()) {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            };
            RecognizedStudent {
                student_id: student.student_id,
                student_number: student.student_number,
                first_name: student.first_name,
                last_name: student.last_name,
                status,
            }
        })
        .collect();

    let known: HashSet<&str> = students.iter().map(|s| s.student_number.as_str()).collect();
    let mut unknown_numbers: Vec<String> = recognized
        .iter()
        .filter(|number| !known.contains(*number))
        .map(|number| number.to_string())
        .collect();
    unknown_numbers.sort();

    let present_count = students
        .iter()
        .filter(|s| s.status == AttendanceStatus::Present)
        .count();
    RecognizedAttendanceResponse {
        class_id,
        total_students: students.len(),
        present_count,
        absent_count: students.len() - present_count,
        students,
        unknown_numbers,
    }
}

pub async fn recognized_attendance(
    service: &AttendanceService,
    request: &HttpRequest,
    recognized: RecognizedAttendanceRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    try_response!(ensure_class_access(&storage, &user, recognized.class_id).await);

    let roster = match storage.list_class_roster(recognized.class_id).await {
        Ok(roster) => roster,
        Err(e) => return Ok(error_response(e)),
    };

    if let Err(e) = storage.increment_ai_usage(Local::now().date_naive()).await {
        warn!("Failed to record AI usage: {}", e);
    }

    let response = match_roster(recognized.class_id, roster, &recognized.student_numbers);
    if !response.unknown_numbers.is_empty() {
        warn!(
            "Recognition for class {} returned {} numbers outside the roster",
            recognized.class_id,
            response.unknown_numbers.len()
        );
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Recognition result mapped to class roster",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, number: &str) -> ClassStudent {
        ClassStudent {
            student_id: id,
            student_number: number.to_string(),
            first_name: format!("Ad{id}"),
            last_name: format!("Soyad{id}"),
            absences_count: 0,
            remaining_absences: 3,
        }
    }

    #[test]
    fn test_match_roster() {
        let roster = vec![student(1, "1001"), student(2, "1002"), student(3, "1003")];
        let numbers = vec![
            " 1001".to_string(),
            "1003".to_string(),
            "1003".to_string(),
            "9999".to_string(),
            "".to_string(),
        ];

        let result = match_roster(7, roster, &numbers);
        assert_eq!(result.total_students, 3);
        assert_eq!(result.present_count, 2);
        assert_eq!(result.absent_count, 1);
        assert_eq!(result.students[1].status, AttendanceStatus::Absent);
        assert_eq!(result.unknown_numbers, vec!["9999".to_string()]);
    }

    #[test]
    fn test_empty_recognition_marks_everyone_absent() {
        let result = match_roster(1, vec![student(1, "1001")], &[]);
        assert_eq!(result.present_count, 0);
        assert_eq!(result.absent_count, 1);
        assert!(result.unknown_numbers.is_empty());
    }
}
