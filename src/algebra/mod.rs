//! Sparse polynomial algebra over decision-variable ids.
//!
//! A [`Function`] is a tagged union by degree:
//! `Constant ⊂ Linear ⊂ Quadratic ⊂ Polynomial`. Arithmetic promotes the
//! tag monotonically — the sum of the operand degrees for multiplication,
//! the maximum for addition — and the tag never demotes, even when terms
//! cancel. Monomials are canonicalized by sorting variable ids; duplicate
//! monomials produced by any operation are merged by summing coefficients,
//! and exact-zero coefficients resulting from a merge are retained (no
//! implicit pruning).

mod content;
mod evaluate;
mod function;

pub use function::{Function, Linear, Monomial, Polynomial, Quadratic};
