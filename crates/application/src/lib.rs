//! 应用层实现。
//!
//! 这里提供聊天核心的协议状态机（Dispatcher）、房间注册表、
//! 会话生命周期，以及对外部适配器（消息存储、身份验证、时钟）
//! 的抽象。

pub mod clock;
pub mod dispatcher;
pub mod dto;
pub mod registry;
pub mod session;
pub mod store;
pub mod verifier;


pub use clock::{Clock, SystemClock};
pub use dispatcher::{Dispatcher, DispatcherDependencies};
pub use dto::ChatMessageDto;
pub use registry::RoomRegistry;
pub use session::{Session, SessionState};
pub use store::{MemoryMessageStore, MessageStore, StoreError};
pub use verifier::{IdentityVerifier, StaticVerifier};
