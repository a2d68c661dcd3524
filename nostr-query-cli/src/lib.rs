//! Nostr Query CLI Library
//!
//! This library provides reusable components for the nostr-query CLI tool.

pub mod config;
pub mod filter;
pub mod output;
