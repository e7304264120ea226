pub mod macros;

pub mod achievements;
pub mod catalog;
pub mod celebration;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod random;
pub mod roulette;
pub mod search;
pub mod storage;
pub mod types;
