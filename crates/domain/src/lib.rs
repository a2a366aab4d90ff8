//! 聊天核心领域模型。
//!
//! 只包含纯类型和不变量：消息、值对象、身份、错误分类。
//! 不做任何 I/O，也不依赖异步运行时。

pub mod errors;
pub mod identity;
pub mod message;
pub mod value_objects;

pub use errors::{ChatError, ChatResult};
pub use identity::Identity;
pub use message::ChatMessage;
pub use value_objects::{MessageText, RoomName, SessionId, Timestamp};
