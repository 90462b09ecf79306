pub mod error;
pub mod openrouter;
pub mod util;

pub use error::{AiError, Result};
pub use openrouter::{ChatCompletion, OpenRouter};
pub use util::{truncate_chars_with_ellipsis, truncate_to_char_boundary};
