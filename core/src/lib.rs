pub mod error;
pub mod fallback;
pub mod filter;
pub mod intent;
pub mod items;
pub mod search;
