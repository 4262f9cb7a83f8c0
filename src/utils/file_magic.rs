/// 根据文件头识别图片格式，返回带点号的规范扩展名
pub fn detect_image_extension(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(".jpg")
    } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(".png")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some(".webp")
    } else {
        None
    }
}

/// 文件头是否与声明的扩展名一致（`.jpeg` 视同 `.jpg`）
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    let declared = match extension.to_lowercase().as_str() {
        ".jpeg" => ".jpg".to_string(),
        other => other.to_string(),
    };
    detect_image_extension(data) == Some(declared.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(detect_image_extension(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(".jpg"));
        assert_eq!(
            detect_image_extension(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Some(".png")
        );
        assert_eq!(detect_image_extension(b"RIFF\0\0\0\0WEBPVP8 "), Some(".webp"));
        assert_eq!(detect_image_extension(b"%PDF-1.4"), None);
        assert_eq!(detect_image_extension(&[]), None);
    }

    #[test]
    fn test_extension_must_match() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE1];
        assert!(validate_magic_bytes(&jpeg, ".jpg"));
        assert!(validate_magic_bytes(&jpeg, ".JPEG"));
        assert!(!validate_magic_bytes(&jpeg, ".png"));
        assert!(!validate_magic_bytes(b"MZ\x90\x00", ".exe"));
    }
}
