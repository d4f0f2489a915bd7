pub mod gemini;
pub mod mock;
pub mod provider;
pub mod relay;
