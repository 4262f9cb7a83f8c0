use crate::config::AppConfig;
use crate::errors::AttendifyError;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::{Rng, distr::Alphanumeric};

fn hasher(memory_cost: u32, time_cost: u32, parallelism: u32) -> Result<Argon2<'static>, AttendifyError> {
    let params = Params::new(memory_cost, time_cost, parallelism, None)
        .map_err(|e| AttendifyError::validation(format!("Argon2 参数错误: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// 使用配置中的 Argon2id 参数哈希密码
pub fn hash_password(password: &str) -> Result<String, AttendifyError> {
    let config = &AppConfig::get().argon2;
    hash_password_with(password, config.memory_cost, config.time_cost, config.parallelism)
}

pub fn hash_password_with(
    password: &str,
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
) -> Result<String, AttendifyError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(memory_cost, time_cost, parallelism)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AttendifyError::validation(format!("密码哈希失败: {e}")))?;
    Ok(hash.to_string())
}

/// 校验密码，参数从哈希串中读取
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// 生成随机初始密码（字母数字）
pub fn generate_password(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        // 测试中使用最低成本参数
        let hash = hash_password_with("Ogretmen2025", 8, 1, 1).unwrap();
        assert!(verify_password("Ogretmen2025", &hash));
        assert!(!verify_password("ogretmen2025", &hash));
        assert!(!verify_password("Ogretmen2025", "not-a-hash"));
    }

    #[test]
    fn test_generate_password() {
        let password = generate_password(16);
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
