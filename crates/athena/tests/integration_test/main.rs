//! Integration tests for quarry-athena.
//!
//! Everything runs against an in-memory object store and a scripted query
//! service; no AWS credentials are needed.

mod runner;
mod session;
mod support;
