//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): Error codes, including the cookie store range
//! - [`IoResultExt`](context::IoResultExt): Context helpers for I/O results

pub mod context;
pub mod neterror;
