pub mod cancel;
pub mod health;
pub mod process;
pub mod schedule;
