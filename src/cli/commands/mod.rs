pub mod migrate;
pub mod notify;
pub mod procedures;
pub mod token;
