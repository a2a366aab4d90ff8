use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use application::{
    Dispatcher, DispatcherDependencies, MemoryMessageStore, StaticVerifier, SystemClock,
};
use domain::Identity;
use web_api::{router, AppState};

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

pub fn alice_id() -> Uuid {
    Uuid::from_u128(0xa11ce)
}

pub fn bob_id() -> Uuid {
    Uuid::from_u128(0xb0b)
}

/// 构建测试路由：内存消息存储 + 固定映射身份验证器。
pub fn build_router() -> Router {
    let store = Arc::new(MemoryMessageStore::new());
    let verifier = Arc::new(
        StaticVerifier::new()
            .with_identity(
                ALICE_TOKEN,
                Identity::new(alice_id(), "alice", Some("avatars/alice.png".into())),
            )
            .with_identity(BOB_TOKEN, Identity::new(bob_id(), "bob", None)),
    );
    let dispatcher = Arc::new(Dispatcher::new(DispatcherDependencies {
        verifier: verifier.clone(),
        store: store.clone(),
        clock: Arc::new(SystemClock),
    }));

    router(AppState::new(
        dispatcher,
        verifier,
        store,
        config::ChatConfig::default(),
    ))
}
