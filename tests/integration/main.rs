//! Integration tests
//!
//! `api_tests` drives the router in-process over the in-memory store.
//! `live` needs a running server and is ignored by default.

mod api_tests;
mod live;
