//! 密码哈希（Argon2id）

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sentinel_errors::{AppError, AppResult};

/// 凭证哈希器
///
/// 输出 PHC 格式字符串（`$argon2id$v=19$m=..,t=..,p=..$salt$hash`），
/// 参数随摘要一起保存，调整成本后旧摘要仍可验证。
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// 按成本参数创建哈希器
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> AppResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::internal(format!("Invalid argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// 哈希明文密码（加盐，每次输出不同）
    pub fn hash(&self, plain_password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(plain_password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
    }

    /// 验证明文密码是否匹配摘要
    ///
    /// 摘要格式错误时返回 `false`，不会报错。
    pub fn verify(&self, plain_password: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };

        Argon2::default()
            .verify_password(plain_password.as_bytes(), &parsed)
            .is_ok()
    }

    /// 摘要是否使用了与当前配置不同的参数
    pub fn needs_rehash(&self, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return true;
        };
        match Params::try_from(&parsed) {
            Ok(params) => {
                params.m_cost() != self.params.m_cost()
                    || params.t_cost() != self.params.t_cost()
                    || params.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

/// 便捷函数：与账户服务里保存的摘要比较
pub fn password_hash_match(hasher: &CredentialHasher, plain_password: &str, digest: &str) -> bool {
    hasher.verify(plain_password, digest)
}
