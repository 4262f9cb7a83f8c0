use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ExamService;
use crate::config::AppConfig;
use crate::models::ApiResponse;
use crate::models::exams::{
    requests::{CreateExamRequest, NewExam, SeatingOptions},
    responses::ExamCreatedResponse,
};
use crate::services::{bad_request, error_response};
use crate::try_response;
use crate::utils::validate::{normalize_time, parse_date, validate_required};

/// 校验请求并补全默认考场与时间
pub(crate) fn prepare_exam(
    exam_data: CreateExamRequest,
    default_classroom: &str,
    default_time: &str,
) -> Result<NewExam, String> {
    if exam_data.class_id <= 0 {
        return Err("class_id is required".to_string());
    }
    validate_required(&exam_data.exam_name, "exam_name", 200)?;
    let exam_date = parse_date(&exam_data.exam_date, "exam_date")?;
    let exam_time = normalize_time(
        exam_data.exam_time.as_deref().unwrap_or(default_time),
        "exam_time",
    )?;
    let classroom = exam_data
        .classroom
        .map(|room| room.trim().to_string())
        .filter(|room| !room.is_empty())
        .unwrap_or_else(|| default_classroom.to_string());

    Ok(NewExam {
        class_id: exam_data.class_id,
        exam_name: exam_data.exam_name.trim().to_string(),
        classroom,
        exam_date: exam_date.format("%Y-%m-%d").to_string(),
        exam_time,
    })
}

pub async fn create_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_data: CreateExamRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let config = &AppConfig::get().exam;

    let new_exam = try_response!(
        prepare_exam(exam_data, &config.default_classroom, &config.default_time)
            .map_err(bad_request)
    );

    match storage
        .create_exam_with_seating(new_exam, SeatingOptions::from_config(config))
        .await
    {
        Ok(created) => {
            info!(
                "Exam {} created with {} seated students",
                created.exam.id,
                created.plan.seated_count()
            );
            let response = ExamCreatedResponse {
                exam_id: created.exam.id,
                seated_count: created.plan.seated_count(),
                unseated_student_ids: created.plan.unseated,
            };
            Ok(HttpResponse::Created().json(ApiResponse::success(
                response,
                "Exam created successfully",
            )))
        }
        Err(e) => Ok(error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(classroom: Option<&str>, time: Option<&str>) -> CreateExamRequest {
        CreateExamRequest {
            class_id: 1,
            exam_name: " Matematik Vize ".to_string(),
            classroom: classroom.map(str::to_string),
            exam_date: "2025-06-02".to_string(),
            exam_time: time.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults_are_applied() {
        let exam = prepare_exam(request(None, None), "Derslik-1", "00:00").unwrap();
        assert_eq!(exam.exam_name, "Matematik Vize");
        assert_eq!(exam.classroom, "Derslik-1");
        assert_eq!(exam.exam_time, "00:00");
        assert_eq!(exam.exam_date, "2025-06-02");

        let exam = prepare_exam(request(Some("  "), Some("10:30:00")), "Derslik-1", "00:00").unwrap();
        assert_eq!(exam.classroom, "Derslik-1");
        assert_eq!(exam.exam_time, "10:30");
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        let mut bad_date = request(None, None);
        bad_date.exam_date = "02.06.2025".to_string();
        assert!(prepare_exam(bad_date, "Derslik-1", "00:00").is_err());

        assert!(prepare_exam(request(None, Some("25:00")), "Derslik-1", "00:00").is_err());

        let mut no_class = request(None, None);
        no_class.class_id = 0;
        assert!(prepare_exam(no_class, "Derslik-1", "00:00").is_err());
    }
}
