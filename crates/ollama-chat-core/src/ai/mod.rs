pub mod ollama;
pub mod proxy;

pub use ollama::{Generation, OllamaClient};
pub use proxy::ProxyClient;
