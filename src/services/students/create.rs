use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::{StreamExt, TryStreamExt};
use tracing::info;

use super::StudentService;
use super::fields::{
    normalize_optional, parse_class_ids, validate_contact, validate_name, validate_student_number,
};
use super::photos::{REQUIRED_PHOTOS, UploadedPhotos, ensure_upload_dir, save_photo};
use crate::config::{AppConfig, UploadConfig};
use crate::models::students::entities::PhotoType;
use crate::models::students::requests::{
    CreateStudentRequest, NewStudentPhoto, UpdateStudentRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, error_response};
use crate::try_response;

/// 文本字段最大字节数
const MAX_TEXT_FIELD: usize = 1024;

/// multipart 中的文本字段
#[derive(Debug, Default)]
pub(crate) struct StudentForm {
    pub student_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub class_ids: Vec<i64>,
    /// 表单中是否出现过 class_ids 字段（更新时用于区分“清空”与“不修改”）
    pub has_class_ids: bool,
}

impl StudentForm {
    /// 设置文本字段；class_ids 可以重复出现，也可以逗号分隔
    pub fn set(&mut self, name: &str, value: String) -> Result<(), String> {
        match name {
            "student_number" => self.student_number = Some(value),
            "first_name" => self.first_name = Some(value),
            "last_name" => self.last_name = Some(value),
            "email" => self.email = Some(value),
            "phone" => self.phone = Some(value),
            "birth_date" => self.birth_date = Some(value),
            "class_ids" | "class_ids[]" => {
                self.has_class_ids = true;
                self.class_ids.extend(parse_class_ids(&value)?)
            }
            _ => {}
        }
        Ok(())
    }

    /// 校验并与照片路径组合成存储层请求，照片按上传顺序对应 front/right/left/up/down
    pub fn into_request(self, photo_paths: Vec<String>) -> Result<CreateStudentRequest, String> {
        let student_number = self
            .student_number
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        validate_student_number(&student_number)?;
        let first_name = self.first_name.unwrap_or_default();
        validate_name(&first_name, "first_name")?;
        let last_name = self.last_name.unwrap_or_default();
        validate_name(&last_name, "last_name")?;

        let email = normalize_optional(self.email);
        let phone = normalize_optional(self.phone);
        let birth_date = normalize_optional(self.birth_date);
        validate_contact(email.as_deref(), phone.as_deref(), birth_date.as_deref())?;

        if photo_paths.len() != REQUIRED_PHOTOS {
            return Err(format!(
                "Exactly {REQUIRED_PHOTOS} photos are required, got {}",
                photo_paths.len()
            ));
        }

        let mut class_ids = self.class_ids;
        class_ids.sort_unstable();
        class_ids.dedup();

        Ok(CreateStudentRequest {
            student_number,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email,
            phone,
            birth_date,
            class_ids,
            photos: PhotoType::ALL
                .iter()
                .zip(photo_paths)
                .map(|(photo_type, photo_path)| NewStudentPhoto {
                    photo_type: *photo_type,
                    photo_path,
                })
                .collect(),
        })
    }

    /// 转换为更新请求，未出现的字段保持不变；照片按上传顺序对应角度并追加
    pub fn into_update(self, photo_paths: Vec<String>) -> UpdateStudentRequest {
        UpdateStudentRequest {
            student_number: self.student_number,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            birth_date: self.birth_date,
            class_ids: self.has_class_ids.then_some(self.class_ids),
            photos: PhotoType::ALL
                .iter()
                .zip(photo_paths)
                .map(|(photo_type, photo_path)| NewStudentPhoto {
                    photo_type: *photo_type,
                    photo_path,
                })
                .collect(),
        }
    }
}

/// 读取 multipart 表单：文本字段进入 `StudentForm`，照片写入上传目录
///
/// 照片超过 `max_photos` 张时拒绝；出错时已写入的照片随 `UploadedPhotos` 一起删除。
pub(crate) async fn read_student_form(
    payload: &mut Multipart,
    upload: &UploadConfig,
    max_photos: usize,
) -> ActixResult<Result<(StudentForm, UploadedPhotos), HttpResponse>> {
    let mut form = StudentForm::default();
    let mut photos = UploadedPhotos::new();

    while let Some(mut field) = payload.try_next().await? {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        if name == "photos" || name == "photos[]" {
            if photos.len() >= max_photos {
                return Ok(Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::StudentPhotoInvalid,
                    format!("At most {max_photos} photos can be uploaded"),
                ))));
            }
            match save_photo(&mut field, upload).await {
                Ok(photo) => photos.push(photo),
                Err(resp) => return Ok(Err(resp)),
            }
            continue;
        }

        let mut value = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            if value.len() + data.len() > MAX_TEXT_FIELD {
                return Ok(Err(bad_request(format!("Field {name} is too long"))));
            }
            value.extend_from_slice(&data);
        }
        let value = match String::from_utf8(value) {
            Ok(value) => value,
            Err(_) => return Ok(Err(bad_request(format!("Field {name} is not valid UTF-8")))),
        };
        if let Err(e) = form.set(&name, value) {
            return Ok(Err(bad_request(e)));
        }
    }

    Ok(Ok((form, photos)))
}

pub async fn create_student(
    service: &StudentService,
    request: &HttpRequest,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let upload = &AppConfig::get().upload;
    try_response!(ensure_upload_dir(upload));

    let (form, photos) =
        try_response!(read_student_form(&mut payload, upload, REQUIRED_PHOTOS).await?);

    if photos.len() != REQUIRED_PHOTOS {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::StudentPhotoInvalid,
            format!(
                "Exactly {REQUIRED_PHOTOS} photos are required, got {}",
                photos.len()
            ),
        )));
    }
    let student = try_response!(form.into_request(photos.public_paths()).map_err(bad_request));

    match storage.get_student_by_number(&student.student_number).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::StudentAlreadyExists,
                "Student number already exists",
            )));
        }
        Ok(None) => {}
        Err(e) => return Ok(error_response(e)),
    }

    match storage.create_student(student).await {
        Ok(detail) => {
            photos.keep();
            info!(
                "Student {} created with {} photos",
                detail.student.student_number,
                detail.photos.len()
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                detail,
                "Student created successfully",
            )))
        }
        Err(e) => Ok(error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> StudentForm {
        let mut form = StudentForm::default();
        form.set("student_number", " 2024001 ".into()).unwrap();
        form.set("first_name", "Zeynep".into()).unwrap();
        form.set("last_name", "Kaya".into()).unwrap();
        form.set("email", "".into()).unwrap();
        form.set("class_ids", "3,1".into()).unwrap();
        form.set("class_ids", "1".into()).unwrap();
        form.set("unknown", "ignored".into()).unwrap();
        form
    }

    fn paths(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("/uploads/{i}.jpg")).collect()
    }

    #[test]
    fn test_form_into_request() {
        let request = filled_form().into_request(paths(5)).unwrap();
        assert_eq!(request.student_number, "2024001");
        assert_eq!(request.email, None);
        assert_eq!(request.class_ids, vec![1, 3]);
        assert_eq!(request.photos.len(), 5);
        assert_eq!(request.photos[0].photo_type, PhotoType::ALL[0]);
        assert_eq!(request.photos[4].photo_path, "/uploads/4.jpg");
    }

    #[test]
    fn test_photo_count_must_be_exact() {
        assert!(filled_form().into_request(paths(4)).is_err());
        assert!(filled_form().into_request(paths(6)).is_err());
    }

    #[test]
    fn test_form_into_update_keeps_absent_fields() {
        let mut form = StudentForm::default();
        form.set("first_name", "Ayşe".into()).unwrap();
        let update = form.into_update(paths(2));
        assert_eq!(update.first_name.as_deref(), Some("Ayşe"));
        assert_eq!(update.student_number, None);
        assert_eq!(update.class_ids, None);
        assert_eq!(update.photos.len(), 2);
        assert_eq!(update.photos[1].photo_type, PhotoType::Right);

        let mut form = StudentForm::default();
        form.set("class_ids", "".into()).unwrap();
        assert_eq!(form.into_update(Vec::new()).class_ids, Some(Vec::new()));
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let mut form = StudentForm::default();
        form.set("student_number", "2024002".into()).unwrap();
        form.set("last_name", "Demir".into()).unwrap();
        assert!(form.into_request(paths(5)).is_err());
        assert!(StudentForm::default().set("class_ids", "a".into()).is_err());
    }
}
