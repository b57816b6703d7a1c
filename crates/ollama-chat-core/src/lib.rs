pub mod ai;
pub mod code_block;
pub mod config;
pub mod preview;
pub mod protocol;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{Generation, OllamaClient, ProxyClient};
pub use code_block::{code_blocks, segment_message, CodeBlock, Segment};
pub use config::Config;
pub use preview::{render_preview, Preview, PreviewKind};
pub use protocol::{ChatRequest, ChatResponse, ConversationContext, ErrorResponse};
pub use session::{ChatSession, SubmitOutcome, COPY_CONFIRM_DURATION, REFOCUS_DELAY};
pub use state::{ChatMessage, ChatRole};
