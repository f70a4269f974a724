pub mod ai;
pub mod config;
pub mod conversation;
pub mod markdown;
pub mod session;

// Re-export main types for convenience
pub use ai::GroqClient;
pub use config::Config;
pub use conversation::{Conversation, Message, Role};
pub use markdown::{format_line, segment, InlineSpan, InlineStyle, Segment};
pub use session::{ChatSession, Ticket};
