//! Velluto Core - Shared types library.
//!
//! This crate provides the types shared by all Velluto Motors components:
//! - `cms` - The live site-configuration synchronization engine
//! - `admin` - The CMS editing surface (JSON API)
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`document`] - The `SiteConfiguration` document model and its defaults
//! - [`currency`] - Currency rates and USD price formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod currency;
pub mod document;

pub use currency::{CurrencyRate, format_usd};
pub use document::{
    AboutContent, ContactContent, CustomSection, DealOfTheWeek, FaqEntry, FinancingContent,
    HomeContent, InventoryContent, SectionLayout, SiteConfiguration, Testimonial,
};
