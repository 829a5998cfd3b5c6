// src/preprocessing/mod.rs

pub mod roster;
pub mod text_cleaner;

pub use roster::RosterBuilder;
pub use text_cleaner::{hard_clean, soft_clean};
