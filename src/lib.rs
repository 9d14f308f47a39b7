pub mod archive;
pub mod cleanup;
pub mod commands;
pub mod config;
pub mod digest;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod platform;
pub mod release;
pub mod report;
pub mod runtime;
