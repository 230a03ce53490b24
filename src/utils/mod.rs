pub mod json;
pub mod logging;

pub use json::{clean_json_block, parse_embedded_object};
pub use logging::init_tracing;
