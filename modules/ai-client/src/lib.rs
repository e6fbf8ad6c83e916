pub mod gemini;
pub mod schema;
pub mod util;

pub use gemini::Gemini;
pub use schema::StructuredOutput;
pub use util::{fenced_blocks, strip_code_blocks};
