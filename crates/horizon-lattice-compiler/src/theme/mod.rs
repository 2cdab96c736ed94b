//! Theme variables declared through `@theme`.

mod options;
mod variables;

pub use options::{ThemeOptions, ThemeParams};
pub use variables::{Theme, ThemeEntry};
