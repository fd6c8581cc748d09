pub mod admin;
pub mod simulate;
