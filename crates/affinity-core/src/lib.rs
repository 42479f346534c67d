//! # Affinity Core
//!
//! Core types, similarity primitives and collaborator traits for the
//! Affinity recommendation engine.
//!
//! The engine links a source entity to ranked target entities with one of
//! two interchangeable algorithms:
//!
//! - **Co-occurrence**: count how often two values appear in the same group
//! - **Similarity**: weighted mean of Hamming, Euclidean and Jaccard scores
//!   over configured attribute sets
//!
//! This crate holds everything that does not touch storage: the record and
//! edge model, named configuration, the 0-100 similarity primitives and the
//! traits the runtime talks to (`ObservationSource`, `RecordSource`,
//! `EdgeStore`, `ConfigSource`, `Diagnostics`).
//!
//! ## Quick Start
//!
//! ```rust
//! use affinity_core::prelude::*;
//!
//! let a = Record::new("1").with_attribute("color", "red");
//! let b = Record::new("2").with_attribute("color", "red");
//!
//! assert_eq!(hamming(&a.text("color"), &b.text("color")), 100.0);
//! ```

pub mod types;
pub mod config;
pub mod similarity;
pub mod store;
pub mod diagnostics;
pub mod error;
pub mod prelude;
