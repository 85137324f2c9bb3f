// -- Lint policy ---------------------------------------------------------
// Crate-wide lints live in Cargo.toml; the hard guarantees are repeated
// here.

// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Documentation
#![deny(missing_docs)]
// Import hygiene
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Nested, instanced group hierarchy for 3D scene editors.
//!
//! Groupnest collapses a selection of scene entities into a named group that
//! is placed by a single proxy entity. Groups nest inside each other and may
//! be shared under several parents; the nesting graph is kept acyclic at all
//! times. Groups can be opened for in-place editing, one level at a time,
//! along a breadcrumb stack.
//!
//! # Key entry points
//!
//! - [`engine::GroupEngine`] - the façade a host binds its commands to
//! - [`engine::GroupCommand`] - the command vocabulary
//! - [`hierarchy::Hierarchy`] - the group store, cycle checks and persistence
//! - [`navigator::Navigator`] - the edit-context stack
//! - [`host::SceneHost`] - what the host editor must provide
//! - [`options::Options`] - runtime configuration (storage, naming,
//!   tolerance)
//!
//! # Model
//!
//! Each member stores a transform local to its group's origin; the origin is
//! the proxy's placement. World transforms are derived by composing proxy
//! placements down the owning chain, so moving a proxy moves everything it
//! instances, and editing a shared group once changes every instance.

pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod host;
pub mod navigator;
pub mod options;
pub mod transform;
