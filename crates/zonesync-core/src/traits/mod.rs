//! Core traits for zone synchronization
//!
//! This module defines the abstract interfaces that provider implementations follow.
//!
//! - [`DnsProvider`]: Read and write zone records via a provider API

pub mod dns_provider;

pub use dns_provider::{ApplyReport, DnsProvider, DnsProviderFactory};
