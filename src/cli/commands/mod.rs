pub mod database;
pub mod token;
