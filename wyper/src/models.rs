pub mod chat;
pub mod post;

pub use chat::{ChatEntry, ChatMessage, CurrentUser, Delivery, NewChatMessage, SendOutcome};
pub use post::{Post, PostInput, SaveOutcome};
