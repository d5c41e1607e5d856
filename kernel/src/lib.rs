//! The trusted kernel of the proof assistant.
//!
//! This crate defines the core terms of a dependent type theory with identity types and cubical
//! paths, their de Bruijn algebra, normalization by evaluation, the metavariable store, the
//! global environment with its builtin inductive types, and the bidirectional type checker.

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

mod builtins;
pub mod context;
pub mod environment;
pub mod error;
pub mod inductive;
pub mod location;
pub mod meta;
pub mod nbe;
pub mod term;
pub mod type_checker;
pub mod value;
pub mod zonk;

pub use context::Context;
pub use environment::Environment;
pub use error::{Error, Kind, Result};
pub use meta::MetaStore;
pub use term::{Icity, MetaId, Name, Term};
pub use type_checker::TypeChecker;
