//! # Axon Facts
//!
//! The fact store underneath the Axon network: predicate values, durable
//! content-addressed identity, and the deterministic decomposition of a
//! predicate into the feature paths the discrimination tree routes on.
//!
//! A [`Predicate`] is a verb plus labeled arguments (terms or nested
//! predicates). Asserting one produces a [`Fact`] whose [`FactId`] is the
//! SHA-256 of its canonical form, so re-asserting the same predicate is
//! idempotent. [`decompose`] turns any predicate of a given shape into the
//! same ordered list of [`Path`]s — the property prefix sharing in the
//! network relies on.

pub mod jsonl;
pub mod path;
pub mod predicate;
pub mod store;

pub use jsonl::JsonlError;
pub use path::{Path, PathKind, Resolved, decompose, resolve};
pub use predicate::{Arg, Fact, FactId, Predicate};
pub use store::FactSet;
