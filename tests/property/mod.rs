// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `serialization`: storage round-trips of maps and entities
//! - `traversal`: shortest paths over generated chains

mod serialization;
mod traversal;
