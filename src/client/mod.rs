//! Client Module
//!
//! HTTP transport for the API.

pub mod http;

pub use http::{decode_error_body, HttpClient, ResponseBody};
