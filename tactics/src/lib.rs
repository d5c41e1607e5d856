//! Interactive proofs by tactics.
//!
//! A [`ProofState`] holds the goals left to prove a statement, each one an unsolved metavariable
//! of the kernel. [`Tactic`]s solve goals with proof skeletons whose holes become new goals, and
//! combinators such as [`tactic::seq`] or [`tactic::orelse`] compose them. Once no goal is left,
//! the proof term is extracted and checked once more by the kernel.

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

pub mod argument;
pub mod elimination;
pub mod error;
pub mod primitives;
pub mod proof_state;
pub mod rewrite;
pub mod tactic;

pub use argument::Argument;
pub use error::{Error, Kind, Result};
pub use proof_state::{Goal, ProofState, Subgoal};
pub use tactic::{run, Tactic};
