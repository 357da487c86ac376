pub mod headless;
pub mod loader;

pub use loader::{SdkBootstrap, SdkConfig, SdkError, SdkLoader, SdkScript};
