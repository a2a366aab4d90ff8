use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use application::ChatMessageDto;
use domain::RoomName;

use crate::{error::ApiError, state::AppState, ws_connection};

#[derive(Debug, Deserialize)]
struct BacklogQuery {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms/{room}/messages", get(get_backlog))
        .route("/ws", get(websocket_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// 回看端点：返回房间最近 N 条持久化消息，旧到新。
///
/// 纯读取，不触碰房间注册表；客户端拉取一次后再订阅实时流，
/// 按 `sequence_id` 去重合并。
async fn get_backlog(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Query(query): Query<BacklogQuery>,
) -> Result<Json<Vec<ChatMessageDto>>, ApiError> {
    let room = RoomName::parse(room)?;
    let limit = query
        .limit
        .unwrap_or(state.chat.backlog_default_limit)
        .min(state.chat.backlog_max_limit);

    let items = state.store.query_recent(&room, limit).await?;
    Ok(Json(items.iter().map(ChatMessageDto::from).collect()))
}

/// WebSocket 升级：凭证在升级前验证，无效直接 401，连接
/// 根本不会建立。
async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    state
        .verifier
        .verify(&query.token)
        .await
        .map_err(|_| ApiError::unauthorized("invalid credential"))?;

    Ok(ws.on_upgrade(move |socket| ws_connection::run(socket, state, query.token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use application::{
        Dispatcher, DispatcherDependencies, MemoryMessageStore, MessageStore, StaticVerifier,
        SystemClock,
    };
    use axum::body::Body;
    use axum::http::Request;
    use domain::{ChatMessage, Identity, MessageText};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state(store: Arc<MemoryMessageStore>) -> AppState {
        let verifier = Arc::new(StaticVerifier::new());
        let dispatcher = Dispatcher::new(DispatcherDependencies {
            verifier: verifier.clone(),
            store: store.clone(),
            clock: Arc::new(SystemClock),
        });
        AppState::new(
            Arc::new(dispatcher),
            verifier,
            store,
            config::ChatConfig::default(),
        )
    }

    async fn seed(store: &MemoryMessageStore, room: &str, count: usize) {
        let author = Identity::new(Uuid::new_v4(), "seeder", None);
        for i in 0..count {
            let draft = ChatMessage::draft(
                RoomName::parse(room).unwrap(),
                MessageText::parse(format!("m{}", i)).unwrap(),
                &author,
                time::OffsetDateTime::now_utc(),
            );
            store.append(draft).await.unwrap();
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = router(test_state(Arc::new(MemoryMessageStore::new())));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn backlog_returns_recent_messages_oldest_first() {
        let store = Arc::new(MemoryMessageStore::new());
        seed(&store, "General", 5).await;
        let app = router(test_state(store));

        let response = app
            .oneshot(
                Request::get("/api/v1/rooms/General/messages?limit=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let sequences: Vec<u64> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["sequence_id"].as_u64().unwrap())
            .collect();
        assert_eq!(sequences, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn backlog_on_room_without_history_is_empty() {
        let app = router(test_state(Arc::new(MemoryMessageStore::new())));
        let response = app
            .oneshot(
                Request::get("/api/v1/rooms/Quiet/messages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn backlog_limit_is_capped() {
        let store = Arc::new(MemoryMessageStore::new());
        seed(&store, "General", 3).await;
        let app = router(test_state(store));

        // 超过上限的 limit 被钳制，不会被原样透传给存储
        let response = app
            .oneshot(
                Request::get("/api/v1/rooms/General/messages?limit=999999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn backlog_rejects_blank_room_name() {
        let app = router(test_state(Arc::new(MemoryMessageStore::new())));
        let response = app
            .oneshot(
                Request::get("/api/v1/rooms/%20%20/messages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
