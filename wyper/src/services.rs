pub mod chat;
pub mod data;
pub mod editor;

pub use chat::{ChatClient, ChatSession, ChatView, ScrollPosition};
pub use data::DataService;
pub use editor::{Draft, Editor};
