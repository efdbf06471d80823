pub mod config;
pub mod hardware;
pub mod messages;
pub mod motor;
pub mod runtime;
