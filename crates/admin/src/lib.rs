//! Velluto Admin library.
//!
//! This crate provides the CMS editing surface as a library, allowing it to
//! be tested and reused. The binary serves a JSON API only; rendering is the
//! storefront's concern.
//!
//! # Security
//!
//! This surface can rewrite every piece of storefront content and run
//! irreversible bulk wipes. Deploy it on internal-only infrastructure.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
