//! Building blocks of the windowed trace evaluation.
//!
//! The high-level entry points in [`crate::solvers`] are assembled from two
//! small, independently testable pieces:
//!
//! - **`chebyshev`**: the resumable three-term recurrence stream that produces
//!   successive vectors `T_k(H)·v` on demand, together with
//!   [`chebyshev::ChebyshevSeries`] for applying a truncated Chebyshev
//!   expansion of a scalar function to a vector.
//! - **`window`**: the bounded, degree-ordered cache of recurrence vectors
//!   that backs the sliding-window accumulation.
//!
//! Both operate on `faer` column matrices with `c64` entries and perform all
//! operator applications through [`faer::matrix_free::LinOp`], so they work
//! with dense, sparse, or implicit operators alike.

pub mod chebyshev;
pub mod window;

pub use chebyshev::{ChebyshevSeries, ChebyshevStream};
pub use window::DegreeWindow;
