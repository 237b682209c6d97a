//! Transport binding for the waymark rule engine.
//!
//! The core crate builds descriptors; this crate puts them on the wire via
//! `reqwest`. Two entry points: [`Client::dispatch`] (fire-and-continue,
//! returns the native response handle) and [`Client::execute`]
//! (completion-style, resolves to an [`Exchange`] with the pipeline metadata
//! attached).

pub mod client;
pub mod error;

pub use client::{Client, ClientBuilder, Exchange};
pub use error::{Error, Result};
