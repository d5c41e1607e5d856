//! Elaboration functions and structures.
//!
//! This crate defines the notion of *builders*, a naive representation of surface terms using
//! names instead of de Bruijn indices, carrying their location in the input text. Builders are
//! either *realised* directly into core terms, or *elaborated* against the kernel: names are
//! resolved, holes and implicit arguments become metavariables and types are reconciled by
//! pattern unification.

#![deny(
    clippy::complexity,
    clippy::correctness,
    clippy::nursery,
    clippy::pedantic,
    clippy::perf,
    clippy::restriction,
    clippy::style,
    clippy::suspicious
)]
#![allow(
    clippy::arithmetic_side_effects,
    clippy::blanket_clippy_restriction_lints,
    clippy::else_if_without_else,
    clippy::exhaustive_enums,
    clippy::exhaustive_structs,
    clippy::implicit_return,
    clippy::integer_arithmetic,
    clippy::match_same_arms,
    clippy::match_wildcard_for_single_variants,
    clippy::missing_trait_methods,
    clippy::mod_module_files,
    clippy::module_name_repetitions,
    clippy::pattern_type_mismatch,
    clippy::separated_literal_suffix,
    clippy::shadow_reuse,
    clippy::shadow_unrelated,
    clippy::std_instead_of_core,
    clippy::wildcard_enum_match_arm
)]
#![cfg_attr(
    test,
    allow(
        clippy::assertions_on_result_states,
        clippy::enum_glob_use,
        clippy::indexing_slicing,
        clippy::non_ascii_literal,
        clippy::too_many_lines,
        clippy::unwrap_used,
        clippy::wildcard_imports,
    )
)]

pub mod builder;
pub mod elaborator;
pub mod error;
pub mod unifier;

pub use builder::{Binder, Builder, Payload};
pub use elaborator::Elaborator;
pub use error::{Error, Kind, Result};
