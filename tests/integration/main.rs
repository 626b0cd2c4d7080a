//! Integration test suite entry point.
//!
//! Every module runs the public service API end to end against the
//! in-memory gateway; `ws_test` additionally drives a real WebSocket
//! client against a served endpoint. No external services are required.

mod helpers;

mod conversation_test;
mod mention_test;
mod notification_test;
mod ws_test;
