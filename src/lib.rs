//! # pharmasearch
//!
//! Exact 3D pharmacophore search: given a query of labeled feature points
//! with tolerance spheres, find every conformer in a disk-backed library
//! whose own feature points admit a rigid alignment onto the query within
//! tolerance.
//!
//! ## Pipeline
//!
//! A query's points are decomposed into triangles; each triangle is looked
//! up against a sharded, mmap-backed disk index ([`storage`]) keyed by
//! canonical point-type triple and distance. [`aggregator`] groups the
//! per-triangle hits by conformer. For each conformer, [`correspond`] runs a
//! bitmask-pruned backtracking search over one-to-one point correspondences,
//! and [`align`] verifies each candidate with a weighted Kabsch alignment.
//! Accepted results flow through [`rank`]'s bounded, deduplicated result set.
//! [`pipeline`] wires the whole thing into a cancellable, multi-threaded
//! search; [`query`] defines the public request/response shape.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use pharmasearch::{config::SearchConfig, pipeline, query::Query, storage::TableRegistry};
//!
//! let registry = TableRegistry::new("./index");
//! let query = Query::new(points);
//! let config = SearchConfig::load()?;
//! let results = pipeline::search(&registry, &query, &config, &my_molecule_info, &cancel)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod align;
pub mod arena;
pub mod bitmask;
pub mod cancel;
pub mod config;
pub mod correspond;
pub mod error;
pub mod filter;
pub mod fixed_point;
pub mod point;
pub mod pipeline;
pub mod query;
pub mod rank;
pub mod queue;
pub mod storage;
pub mod sync;
pub mod triplet;

pub use config::SearchConfig;
pub use error::{Error, Result};
pub use point::{PharmaPoint, QueryPoint};
pub use query::{Query, QueryResult};
