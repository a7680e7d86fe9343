pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod middleware;
pub mod rpc;
pub mod server;
pub mod state;

#[cfg(test)]
pub mod testing;
