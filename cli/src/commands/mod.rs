pub mod health;
pub mod parse;
pub mod search;
