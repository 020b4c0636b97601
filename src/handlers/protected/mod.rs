// handlers/protected/mod.rs - Protected handlers (access token required)
//
// Every handler takes a `Caller<P>` so the role guard re-reads the account
// before the service runs. Ownership rules are left to the services.

pub mod auth;
pub mod catalog;
pub mod clients;
pub mod users;
