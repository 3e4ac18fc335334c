pub mod catalog;
pub mod token;
pub mod user;
