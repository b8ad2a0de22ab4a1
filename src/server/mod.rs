pub mod app;
mod deserializers;
pub mod errors;
pub mod pagination;
mod routes;
