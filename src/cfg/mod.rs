// src/cfg/mod.rs

pub mod client_secrets;
pub mod config;
pub mod secure;
