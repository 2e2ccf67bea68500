//! Windowed Chebyshev evaluation of bilinear spectral traces.
//!
//! This crate computes conductivity-like spectral quantities of the form
//!
//! ```text
//! (1/N) · Σ_{i1,i2} C[i1,i2] · ⟨T_{i1}(H)·v1, Da · T_{i2}(H)·v2⟩
//! ```
//!
//! where `H` is a large Hermitian operator, `T_k` are Chebyshev polynomials,
//! and `C` is the core coefficient matrix of a separable approximation whose
//! entries decay away from the diagonal. The seeds are `v1 = q(H)·e1` and
//! `v2 = q(H)·Db[:,0]`, with `q` the approximation's scalar factor.
//!
//! Built on the [`faer`] linear algebra framework, the evaluator operates on
//! matrix-free linear operators ([`faer::matrix_free::LinOp`]) and does not
//! require explicit matrix storage for `H`.
//!
//! ## Algorithm
//!
//! Evaluating the sum naively requires materializing all `n` transformed
//! vectors for both seeds, an `O(n·N)` footprint. [`trace_windowed`] exploits
//! the near-diagonal decay of `C`: it advances two independently paced
//! Chebyshev recurrence streams in lockstep and keeps only a sliding window
//! of at most `min(n, 2·bandwidth + 1)` vectors from the `v1` side, touching
//! exclusively the coefficient entries with `|i1 - i2| <= bandwidth`. Peak
//! extra memory drops to `O(min(n, 2·bandwidth + 1)·N)` while each stream is
//! still pulled exactly `n` times, independent of `bandwidth`.
//!
//! [`trace_reference_dense`] computes the same quantity by full
//! eigendecomposition (`O(N³)`, not memory-bounded) and exists purely as an
//! independent correctness oracle for the windowed evaluator.
//!
//! ## Example Usage
//!
//! The following example evaluates a trace whose coefficient matrix is
//! diagonal, so a window of `bandwidth = 0` already captures every retained
//! term and must agree with the full-band evaluation.
//!
//! ```rust
//! use cheb_window::trace_windowed;
//! use faer::{Mat, MatRef, Par, c64, dyn_stack::{MemBuffer, MemStack}, matrix_free::LinOp};
//!
//! let n_site = 8;
//! // A nearest-neighbor hopping Hamiltonian with spectrum inside [-1, 1].
//! let h = Mat::from_fn(n_site, n_site, |i, j| {
//!     if (i as isize - j as isize).abs() == 1 {
//!         c64::new(0.5, 0.0)
//!     } else {
//!         c64::new(0.0, 0.0)
//!     }
//! });
//! let identity = Mat::from_fn(n_site, n_site, |i, j| {
//!     if i == j { c64::new(1.0, 0.0) } else { c64::new(0.0, 0.0) }
//! });
//!
//! // A diagonal coefficient matrix with decaying entries.
//! let degree = 6;
//! let coeffs = Mat::from_fn(degree, degree, |i, j| {
//!     if i == j {
//!         c64::new(1.0 / (1.0 + i as f64), 0.0)
//!     } else {
//!         c64::new(0.0, 0.0)
//!     }
//! });
//!
//! // Allocate workspace for the operator applications.
//! let mut mem = MemBuffer::new(h.as_ref().apply_scratch(1, Par::Seq));
//! let stack = MemStack::new(&mut mem);
//!
//! // Trivial scalar factor q = 1.
//! let q = |v: MatRef<'_, c64>, _: &mut MemStack| -> Result<Mat<c64>, anyhow::Error> {
//!     Ok(v.to_owned())
//! };
//!
//! let windowed = trace_windowed(
//!     &h.as_ref(), identity.as_ref(), identity.as_ref(), coeffs.as_ref(), q, 0, stack,
//! ).unwrap();
//!
//! let q_full = |v: MatRef<'_, c64>, _: &mut MemStack| -> Result<Mat<c64>, anyhow::Error> {
//!     Ok(v.to_owned())
//! };
//! let full = trace_windowed(
//!     &h.as_ref(), identity.as_ref(), identity.as_ref(), coeffs.as_ref(), q_full,
//!     degree - 1, stack,
//! ).unwrap();
//!
//! assert!((windowed - full).norm() < 1e-12);
//! ```

// Declare the modules that form the crate's API structure.
pub mod algorithms;
pub mod error;
pub mod solvers;
pub mod utils;

// Re-export the main API from solvers for convenient access.
pub use error::SpectralError;
pub use solvers::{SeparableApprox, trace_reference_dense, trace_windowed};
