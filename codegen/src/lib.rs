//! # Eventwire Code Generator
//!
//! ## Purpose
//!
//! Turns a validated event schema into protocol bindings for every supported
//! target language. One compiler front end (schema loading, layout
//! compilation, codec tables) feeds a set of emission backends behind the
//! [`emit::Target`] trait; adding a language means adding one backend, not
//! another compiler.
//!
//! ## Architecture Role
//!
//! ```text
//! schema.json → libs/schema → libs/codec → [codegen] → events.rs
//!                                                    → events.py
//!                                                    → events.h
//! ```
//!
//! ## Failure model
//!
//! Generation is all-or-nothing across targets: every backend renders in
//! memory first, and the first failure aborts the run before any file is
//! written.

pub mod emit;
pub mod targets;

pub use emit::{render, EmitContext, EmitError, Emitter, Target};
