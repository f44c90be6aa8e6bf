//! Mixed-integer polynomial modeling and QUBO reformulation.
//!
//! Models an optimization problem as polynomial functions over typed
//! decision variables, then rewrites it step by step into an unconstrained
//! binary quadratic form:
//!
//! - **Algebra**: a [`Function`](algebra::Function) sum type over constant,
//!   linear, quadratic, and polynomial representations with
//!   degree-promoting arithmetic and exact rational content extraction.
//! - **Bounds**: interval evaluation of a function under per-variable
//!   bounds, used to size slack variables and detect trivial or
//!   infeasible constraints.
//! - **Model**: [`Instance`](model::Instance) — decision variables,
//!   objective, active and removed constraints — and its parametric
//!   counterpart for penalty weights.
//! - **Reformulation**: sense normalization, inequality-to-equality slack
//!   conversion, penalty methods, binary log-encoding of integers, and
//!   the [`to_qubo`](model::Instance::to_qubo) driver chaining them.
//! - **Evaluation**: checking externally supplied assignments, with
//!   automatic reconstruction of log-encoded variables and batched
//!   best-feasible selection.
//!
//! This crate is not a solver: it never searches for an optimum, it only
//! transforms problem representations and evaluates candidate assignments
//! produced elsewhere.

pub mod algebra;
pub mod bound;
pub mod error;
pub mod eval;
pub mod model;
pub mod reform;
