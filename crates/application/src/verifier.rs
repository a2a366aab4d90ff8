use std::collections::HashMap;

use async_trait::async_trait;
use domain::{ChatError, Identity};

/// 身份验证器契约。
///
/// 每条连接在 bind 时消费一次；验证失败即 `IdentityInvalid`，
/// 连接被拆除。聊天核心不自己推导身份。
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity, ChatError>;
}

/// 固定映射的验证器（用于测试和本地开发）。
#[derive(Debug, Default)]
pub struct StaticVerifier {
    identities: HashMap<String, Identity>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, credential: impl Into<String>, identity: Identity) -> Self {
        self.identities.insert(credential.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity, ChatError> {
        self.identities
            .get(credential)
            .cloned()
            .ok_or(ChatError::IdentityInvalid)
    }
}
