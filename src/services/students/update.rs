use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::StudentService;
use super::create::read_student_form;
use super::fields::{normalize_optional, validate_contact, validate_name, validate_student_number};
use super::photos::{REQUIRED_PHOTOS, UploadedPhotos, ensure_upload_dir};
use crate::config::AppConfig;
use crate::models::students::requests::UpdateStudentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, error_response, not_found};
use crate::storage::Storage;
use crate::try_response;

/// 校验提供的字段并去掉首尾空白
pub(crate) fn prepare_update(mut update: UpdateStudentRequest) -> Result<UpdateStudentRequest, String> {
    if let Some(number) = update.student_number.take() {
        let number = number.trim().to_string();
        validate_student_number(&number)?;
        update.student_number = Some(number);
    }
    if let Some(first_name) = update.first_name.take() {
        validate_name(&first_name, "first_name")?;
        update.first_name = Some(first_name.trim().to_string());
    }
    if let Some(last_name) = update.last_name.take() {
        validate_name(&last_name, "last_name")?;
        update.last_name = Some(last_name.trim().to_string());
    }
    update.email = normalize_optional(update.email);
    update.phone = normalize_optional(update.phone);
    update.birth_date = normalize_optional(update.birth_date);
    validate_contact(
        update.email.as_deref(),
        update.phone.as_deref(),
        update.birth_date.as_deref(),
    )?;
    if let Some(class_ids) = update.class_ids.as_mut() {
        if class_ids.iter().any(|id| *id <= 0) {
            return Err("class_ids must contain valid class ids".to_string());
        }
        class_ids.sort_unstable();
        class_ids.dedup();
    }
    Ok(update)
}

pub async fn update_student(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
    update: UpdateStudentRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let update = try_response!(prepare_update(update).map_err(bad_request));
    apply_update(storage, student_id, update, None).await
}

/// multipart 更新：文本字段同 JSON 更新，`photos` 追加为新的参考照片
pub async fn update_student_multipart(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let upload = &AppConfig::get().upload;
    try_response!(ensure_upload_dir(upload));

    let (form, photos) =
        try_response!(read_student_form(&mut payload, upload, REQUIRED_PHOTOS).await?);
    let update = form.into_update(photos.public_paths());
    let update = try_response!(prepare_update(update).map_err(bad_request));
    apply_update(storage, student_id, update, Some(photos)).await
}

async fn apply_update(
    storage: Arc<dyn Storage>,
    student_id: i64,
    update: UpdateStudentRequest,
    photos: Option<UploadedPhotos>,
) -> ActixResult<HttpResponse> {
    if let Some(number) = &update.student_number {
        match storage.get_student_by_number(number).await {
            Ok(Some(existing)) if existing.id != student_id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::StudentAlreadyExists,
                    "Student number already exists",
                )));
            }
            Ok(_) => {}
            Err(e) => return Ok(error_response(e)),
        }
    }

    let added_photos = update.photos.len();
    match storage.update_student(student_id, update).await {
        Ok(Some(student)) => {
            if let Some(photos) = photos {
                photos.keep();
            }
            info!("Student {} updated, {} photos added", student_id, added_photos);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                student,
                "Student updated successfully",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::StudentNotFound, "Student not found")),
        Err(e) => Ok(error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::students::entities::PhotoType;
    use crate::models::students::requests::NewStudentPhoto;

    #[test]
    fn test_prepare_update() {
        let update = prepare_update(UpdateStudentRequest {
            student_number: Some(" 2024003 ".into()),
            first_name: Some(" Elif ".into()),
            email: Some("   ".into()),
            class_ids: Some(vec![4, 2, 4]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.student_number.as_deref(), Some("2024003"));
        assert_eq!(update.first_name.as_deref(), Some("Elif"));
        assert_eq!(update.email, None);
        assert_eq!(update.class_ids, Some(vec![2, 4]));
        assert_eq!(update.last_name, None);
    }

    #[test]
    fn test_prepare_update_keeps_photos() {
        let update = prepare_update(UpdateStudentRequest {
            photos: vec![NewStudentPhoto {
                photo_type: PhotoType::Front,
                photo_path: "/uploads/a.jpg".into(),
            }],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.photos.len(), 1);
    }

    #[test]
    fn test_prepare_update_rejects_bad_fields() {
        assert!(prepare_update(UpdateStudentRequest {
            first_name: Some("".into()),
            ..Default::default()
        })
        .is_err());
        assert!(prepare_update(UpdateStudentRequest {
            class_ids: Some(vec![0]),
            ..Default::default()
        })
        .is_err());
    }
}
