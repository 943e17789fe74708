/// Huddle parser module
///
/// Turns free text into a [`RawIntent`] through a text-to-structure oracle.
pub mod extractor;
pub mod groq;
pub mod traits;

pub use extractor::{IntentExtractor, RawIntent};
pub use groq::GroqClient;
pub use traits::{ExtractionError, IntentOracle, OracleRequest};
