//! HTTP request handlers
//!
//! This module organizes all handlers into logical groups:
//! - `twilio` - Carrier webhooks answered with call-flow documents
//! - `api` - Health, performance, language and call listings
//! - `testing` - Synthetic call lifecycle and conversation events

pub mod api;
pub mod testing;
pub mod twilio;
