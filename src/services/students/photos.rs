//! 学生照片上传
//!
//! 照片先写入上传目录，学生记录提交成功后才保留；任何一步失败都会删除本次写入的文件。

use actix_multipart::Field;
use actix_web::HttpResponse;
use futures_util::StreamExt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::errors::AttendifyError;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate_magic_bytes;

/// 每名学生需要的照片数量（正面、右侧、左侧、仰视、俯视）
pub const REQUIRED_PHOTOS: usize = 5;

#[derive(Debug, Clone)]
pub struct SavedPhoto {
    pub disk_path: PathBuf,
    pub public_path: String,
}

/// 本次请求写入的照片，未调用 `keep` 时在析构时删除
#[derive(Debug, Default)]
pub struct UploadedPhotos {
    photos: Vec<SavedPhoto>,
    kept: bool,
}

impl UploadedPhotos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, photo: SavedPhoto) {
        self.photos.push(photo);
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn public_paths(&self) -> Vec<String> {
        self.photos.iter().map(|p| p.public_path.clone()).collect()
    }

    /// 数据库提交成功后保留文件
    pub fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for UploadedPhotos {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        for photo in &self.photos {
            if let Err(e) = fs::remove_file(&photo.disk_path) {
                warn!(
                    "Failed to remove orphan photo {}: {}",
                    photo.disk_path.display(),
                    e
                );
            }
        }
    }
}

fn photo_error(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

fn upload_failed(e: impl std::fmt::Display) -> HttpResponse {
    error!("{}", AttendifyError::file_operation(format!("{e}")));
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::FileUploadFailed,
        "Failed to store photo",
    ))
}

/// 规范化后的扩展名（带点号、小写）
pub(crate) fn photo_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

/// 确保上传目录存在
pub(crate) fn ensure_upload_dir(config: &UploadConfig) -> Result<(), HttpResponse> {
    if !Path::new(&config.dir).exists() {
        fs::create_dir_all(&config.dir).map_err(upload_failed)?;
    }
    Ok(())
}

/// 把一个照片字段写入上传目录，同时校验扩展名、文件头与大小
pub(crate) async fn save_photo(
    field: &mut Field,
    config: &UploadConfig,
) -> Result<SavedPhoto, HttpResponse> {
    let filename = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .unwrap_or_default()
        .to_string();
    let extension = photo_extension(&filename).unwrap_or_default();
    if !config
        .allowed_types
        .iter()
        .any(|t| t.to_lowercase() == extension)
    {
        return Err(photo_error(
            ErrorCode::FileTypeNotAllowed,
            format!("Photo type not allowed: {filename}"),
        ));
    }

    let stored_name = format!("{}{}", Uuid::new_v4(), extension);
    let disk_path = Path::new(&config.dir).join(&stored_name);
    let photo = SavedPhoto {
        public_path: format!(
            "{}/{}",
            config.public_prefix.trim_end_matches('/'),
            stored_name
        ),
        disk_path,
    };

    let mut file = File::create(&photo.disk_path).map_err(upload_failed)?;
    let mut total_size = 0usize;
    let mut first_chunk = true;
    let result = async {
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| {
                photo_error(ErrorCode::FileUploadFailed, format!("Upload interrupted: {e}"))
            })?;
            if first_chunk {
                first_chunk = false;
                if !validate_magic_bytes(&data, &extension) {
                    return Err(photo_error(
                        ErrorCode::FileTypeNotAllowed,
                        format!("Photo content does not match its extension: {filename}"),
                    ));
                }
            }
            total_size += data.len();
            if total_size > config.max_size {
                return Err(photo_error(
                    ErrorCode::FileSizeExceeded,
                    format!("Photo exceeds the size limit: {filename}"),
                ));
            }
            file.write_all(&data).map_err(upload_failed)?;
        }
        if total_size == 0 {
            return Err(photo_error(
                ErrorCode::StudentPhotoInvalid,
                format!("Photo is empty: {filename}"),
            ));
        }
        Ok::<(), HttpResponse>(())
    }
    .await;

    match result {
        Ok(()) => Ok(photo),
        Err(resp) => {
            let _ = fs::remove_file(&photo.disk_path);
            Err(resp)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_extension() {
        assert_eq!(photo_extension("front.JPG").as_deref(), Some(".jpg"));
        assert_eq!(photo_extension("dir/left.png").as_deref(), Some(".png"));
        assert_eq!(photo_extension("noext"), None);
    }

    #[test]
    fn test_uploaded_photos_are_removed_unless_kept() {
        let dir = std::env::temp_dir().join(format!("attendify-photos-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let first = dir.join("a.jpg");
        let second = dir.join("b.jpg");
        fs::write(&first, b"x").unwrap();
        fs::write(&second, b"x").unwrap();

        let mut dropped = UploadedPhotos::new();
        dropped.push(SavedPhoto {
            disk_path: first.clone(),
            public_path: "/uploads/a.jpg".into(),
        });
        drop(dropped);
        assert!(!first.exists());

        let mut kept = UploadedPhotos::new();
        kept.push(SavedPhoto {
            disk_path: second.clone(),
            public_path: "/uploads/b.jpg".into(),
        });
        assert_eq!(kept.public_paths(), vec!["/uploads/b.jpg".to_string()]);
        kept.keep();
        assert!(second.exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
