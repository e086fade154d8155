//! # Topoview - Entity model for router network topology diagrams
//!
//! This library keeps the set of entities shown in a topology diagram
//! (interior routers, edge routers, clients, brokers and merged client
//! groups) consistent with live discovery data and with a force-directed
//! layout engine.
//!
//! ## Overview
//!
//! Discovery hands over a snapshot of router management addresses. The
//! [`EntityCollection`](topology::EntityCollection) turns each address into an
//! [`Entity`](topology::Entity), deduplicating by name and connection
//! container, and restores saved screen positions. Entities that have never
//! been placed are spread across the canvas and the caller is told to animate
//! the layout until it settles.
//!
//! The layout engine itself lives elsewhere. This crate only supplies the
//! per-type physical parameters it needs: radius, link distance, charge and
//! gravity, all softened as the graph grows.
//!
//! ## Architecture
//!
//! - `topology`: node types, the physical-parameters table, entities and the collection
//! - `discovery`: management source contract, attribute rows and router id parsing
//! - `positions`: saved position records and their stores
//! - `geo`: projection between screen and geographic coordinates
//! - `config`: YAML view configuration
//! - `config_loader`: configuration loading and CLI overrides
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use topoview::discovery::SnapshotSource;
//! use topoview::positions::MemoryPositionStore;
//! use topoview::topology::EntityCollection;
//!
//! let source = SnapshotSource::from_json_file("snapshot.json".as_ref())?;
//! let store = MemoryPositionStore::new();
//!
//! let mut collection = EntityCollection::new();
//! let animate = collection.initialize(source.snapshot(), &store, 960.0, 640.0)?;
//!
//! for entity in &collection {
//!     println!("{} {} r={}", entity.name, entity.title(), entity.radius());
//! }
//! # let _ = animate;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Library errors are `thiserror` enums local to each module. Lookup misses
//! are not errors: they return `None` or a default radius. The binary reports
//! failures through `color_eyre`.

pub mod config;
pub mod config_loader;
pub mod discovery;
pub mod geo;
pub mod positions;
pub mod topology;
