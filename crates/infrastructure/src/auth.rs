//! JWT 身份验证器
//!
//! 实现聊天核心的身份验证器契约：验证一个 bearer 凭证并给出
//! 稳定的用户身份。会话签发本身是外部协作者的职责，这里只消费。

use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::IdentityVerifier;
use config::JwtConfig;
use domain::{ChatError, Identity};

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// 用户ID
    pub sub: Uuid,
    /// 显示名
    pub name: String,
    /// 头像引用（可选）
    pub avatar: Option<String>,
    /// 过期时间 (Unix timestamp)
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
}

impl JwtIdentityVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_ref()),
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity, ChatError> {
        let data = decode::<Claims>(credential, &self.decoding_key, &Validation::default())
            .map_err(|err| {
                tracing::debug!(error = %err, "JWT 验证失败");
                ChatError::IdentityInvalid
            })?;

        Ok(Identity::new(
            data.claims.sub,
            data.claims.name,
            data.claims.avatar,
        ))
    }
}
