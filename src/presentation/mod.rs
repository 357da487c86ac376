pub mod filter;
pub mod overlay;
