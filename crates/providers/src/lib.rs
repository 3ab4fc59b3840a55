pub mod fallback;
pub mod huggingface;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod resolver;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use fallback::fallback_reply;
pub use resolver::{Reply, ReplySource, ResponseResolver};
pub use traits::TextBackend;
