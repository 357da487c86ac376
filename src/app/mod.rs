pub mod preview;

pub use preview::{run_preview, PreviewOptions, PreviewReport};
