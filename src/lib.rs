// Library for the binary, the demo and tests

pub mod cache;
pub mod config;
pub mod decoder;
pub mod dump_repo;
pub mod health;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod retention_worker;
pub mod routes;
pub mod stats;
pub mod version;
pub mod worker;
