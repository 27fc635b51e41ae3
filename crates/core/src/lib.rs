//! Core data types for the trending token bot.

pub mod clock;
pub mod token;

pub use clock::*;
pub use token::*;
