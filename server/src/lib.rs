pub mod routes;
pub mod server;

pub use server::{AppState, DEFAULT_PORT, PORT_ENV, app, run};
