//! Web API 层。
//!
//! 暴露两个面向客户端的入口：回看端点（请求/响应读取最近的
//! 持久化消息）和 WebSocket 实时通道（join/send 入站事件，
//! message 出站事件）。页面渲染和其它 CRUD 面由外部协作者承担。

pub mod error;
pub mod routes;
pub mod state;
pub mod ws_connection;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
