//! harkd: local daemon managing virtual machine metadata.
//!
//! This server:
//! - Keeps machine records in a single JSON document under the state dir
//! - Serializes writers with a file lock plus an in-process mutex
//! - Routes HTTP requests through a regex route table
//! - Wraps every response in the `payload` / `error` envelope

pub mod codec;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod routes;
pub mod routing;
pub mod server;
pub mod services;
