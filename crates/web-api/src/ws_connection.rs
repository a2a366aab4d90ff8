//! WebSocket 连接处理
//!
//! 每条连接一个轻量任务：bind 之后进入主循环，select 实时
//! 扇出流和客户端入站帧。所有对 socket 的写都发生在这一个
//! 任务里，广播帧和错误帧天然串行。

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use application::ChatMessageDto;
use domain::ChatError;

use crate::state::AppState;

/// 客户端入站事件
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// 加入房间（隐式离开之前的房间）
    Join { room: String },
    /// 发送消息（房间由当前成员关系决定）
    Send { text: String },
}

/// 服务端出站事件
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// 房间内的新消息
    Message { message: ChatMessageDto },
    /// 针对发起方的错误信号，其它成员观察不到任何东西
    Error { code: &'static str, message: String },
}

fn error_code(error: &ChatError) -> &'static str {
    match error {
        ChatError::IdentityInvalid => "IDENTITY_INVALID",
        ChatError::NotBound => "NOT_BOUND",
        ChatError::NotInRoom => "NOT_IN_ROOM",
        ChatError::EmptyInput { .. } => "EMPTY_INPUT",
        ChatError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
        ChatError::SessionClosed => "SESSION_CLOSED",
    }
}

/// 运行一条 WebSocket 连接直到断开。
///
/// 传输层 close、网络错误和出站写失败都会走到同一个出口：
/// `disconnect()`，把会话从房间注册表移除并进入终态。
pub async fn run(mut socket: WebSocket, state: AppState, credential: String) {
    let (mut session, mut outbound) = state.dispatcher.open_session();

    // 绑定成功之前不接受任何消息流量
    if let Err(err) = state.dispatcher.bind(&mut session, &credential).await {
        tracing::warn!(session_id = %session.id(), error = %err, "bind 失败，拆除连接");
        let _ = socket.close().await;
        return;
    }

    let (mut sender, mut incoming) = socket.split();

    loop {
        tokio::select! {
            // 实时扇出：无消息可投递时挂起在 recv 上
            maybe_message = outbound.recv() => {
                let Some(message) = maybe_message else { break };
                let frame = ServerEvent::Message {
                    message: ChatMessageDto::from(&message),
                };
                let payload = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to serialize websocket payload");
                        continue;
                    }
                };
                if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            // 客户端入站帧
            maybe_frame = incoming.next() => {
                match maybe_frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(error) =
                            handle_client_event(&state, &mut session, &text.to_string()).await
                        {
                            let frame = ServerEvent::Error {
                                code: error_code(&error),
                                message: error.to_string(),
                            };
                            let payload = serde_json::to_string(&frame)
                                .unwrap_or_else(|_| String::from("{\"type\":\"Error\"}"));
                            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                                break;
                            }
                            if matches!(error, ChatError::SessionClosed) {
                                break;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        if sender.send(WsMessage::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Pong(_))) | Some(Ok(WsMessage::Binary(_))) => {}
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(session_id = %session.id(), error = %err, "WebSocket 读取错误");
                        break;
                    }
                }
            }
        }
    }

    // 连接拆除立即运行 disconnect，会话不再计入房间成员
    state.dispatcher.disconnect(&mut session);
    tracing::info!(session_id = %session.id(), "WebSocket 连接已断开并清理");
}

/// 处理一条客户端事件；返回需要回给发起方的错误（若有）。
async fn handle_client_event(
    state: &AppState,
    session: &mut application::Session,
    text: &str,
) -> Option<ChatError> {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(session_id = %session.id(), error = %err, "无法解析客户端事件");
            return Some(ChatError::empty_input("event"));
        }
    };

    let result = match event {
        ClientEvent::Join { room } => state.dispatcher.join(session, &room).map(|_| ()),
        ClientEvent::Send { text } => state
            .dispatcher
            .send(session, &text)
            .await
            .map(|_| ()),
    };

    result.err()
}
