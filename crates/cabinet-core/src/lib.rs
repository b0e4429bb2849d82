pub mod archive;
pub mod checksum;
pub mod classify;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fsutil;
pub mod ident;
pub mod manifest;
pub mod runtime;
pub mod scan;
pub mod source;
pub mod store;

#[cfg(test)]
mod tests;
