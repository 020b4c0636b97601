pub mod gateway;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod seed;

pub use gateway::{EntityGateway, Fields, Key, Row, Transition, TransitionOutcome};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryGateway;
pub use models::Table;
pub use postgres::PgGateway;
