pub mod clock;
pub mod config;
pub mod error;
pub mod kem;
pub mod nvm;
pub mod power;
pub mod ring;
pub mod scheduler;

pub mod keccak;
pub mod shake;

pub use error::{Result, TesseraError};
