pub mod demo;
pub mod kem;
pub mod run;
pub mod verify;
