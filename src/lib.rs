pub mod chat;
pub mod config;
pub mod error;
pub mod gemini;
pub mod interpreter;
pub mod logging;
pub mod prompt;
pub mod render;
pub mod request;
pub mod verdict;
pub mod web_server;

pub use config::GeminiConfig;
pub use error::{VerifyError, UNAVAILABLE_MESSAGE};
pub use gemini::GeminiClient;
pub use interpreter::{build_request, parse_response, ResponseInterpreter};
pub use request::{InlineImage, VerificationRequest};
pub use verdict::{GroundingSource, Verdict, VerificationResult};
