//! Resumable Chebyshev recurrence streams.
//!
//! The Chebyshev polynomials of the first kind satisfy the three-term
//! recurrence
//!
//! ```text
//! T_0(x) = 1,    T_1(x) = x,    T_{k+1}(x) = 2x·T_k(x) - T_{k-1}(x)
//! ```
//!
//! and the same recurrence holds for the matrix polynomials `T_k(H)` applied
//! to a fixed seed vector `v`. [`ChebyshevStream`] exposes this sequence as a
//! pull-based cursor: each [`ChebyshevStream::advance`] call produces the next
//! vector `T_k(H)·v` from the stored pair `(T_{k-1}·v, T_k·v)`, at the cost of
//! one operator application and `O(N)` memory, never recomputing from the
//! start. The cursor survives across call sites, so a consumer may pre-fill a
//! batch with [`ChebyshevStream::advance_many`] and continue pulling single
//! elements later; this resumability is what the sliding-window evaluator in
//! [`crate::solvers`] is built on.
//!
//! Streams are bounded: a stream constructed with `limit` terms refuses the
//! `limit + 1`-th pull with an error rather than silently producing vectors a
//! consumer never accounted for.

use crate::error::{SpectralError, SpectralErrorKind};
use faer::{c64, dyn_stack::MemStack, matrix_free::LinOp, prelude::*};

/// A resumable, bounded stream of Chebyshev-transformed vectors `T_k(H)·v`.
///
/// The stream holds a borrow of the operator and owns the live recurrence
/// pair. Distinct streams share nothing except the operator borrow, so two
/// streams over the same `H` can be advanced at independent paces.
#[derive(Debug)]
pub struct ChebyshevStream<'a, O> {
    operator: &'a O,
    /// `T_{k-1}(H)·v`; meaningful once two elements have been produced.
    v_prev: Mat<c64>,
    /// `T_k(H)·v` for the most recently produced element (the seed before the
    /// first pull).
    v_curr: Mat<c64>,
    /// Number of elements produced so far.
    position: usize,
    /// Total number of elements this stream may produce.
    limit: usize,
}

impl<'a, O: LinOp<c64>> ChebyshevStream<'a, O> {
    /// Creates a stream positioned before its first element.
    ///
    /// The first `advance` returns `v` itself (`T_0(H)·v`), the second returns
    /// `H·v`, and subsequent pulls follow the three-term recurrence. At most
    /// `limit` elements will ever be produced.
    pub fn new(
        operator: &'a O,
        seed: MatRef<'_, c64>,
        limit: usize,
    ) -> Result<Self, SpectralError> {
        let n = operator.nrows();
        if operator.ncols() != n {
            return Err(SpectralErrorKind::DimensionMismatch {
                context: "operator H",
                expected_rows: n,
                expected_cols: n,
                actual_rows: operator.nrows(),
                actual_cols: operator.ncols(),
            }
            .into());
        }
        if seed.nrows() != n || seed.ncols() != 1 {
            return Err(SpectralErrorKind::DimensionMismatch {
                context: "seed vector",
                expected_rows: n,
                expected_cols: 1,
                actual_rows: seed.nrows(),
                actual_cols: seed.ncols(),
            }
            .into());
        }

        Ok(Self {
            operator,
            v_prev: Mat::zeros(n, 1),
            v_curr: seed.to_owned(),
            position: 0,
            limit,
        })
    }

    /// Number of elements produced so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Produces the next vector in the sequence, advancing the cursor by one.
    ///
    /// Fails with the exhaustion error once `limit` elements have been
    /// produced.
    pub fn advance(&mut self, stack: &mut MemStack) -> Result<Mat<c64>, SpectralError> {
        if self.position >= self.limit {
            return Err(SpectralErrorKind::Exhausted { limit: self.limit }.into());
        }

        let produced = match self.position {
            // T_0(H)·v is the seed itself; no operator application needed.
            0 => self.v_curr.clone(),
            // T_1(H)·v = H·v.
            1 => {
                let mut next = Mat::zeros(self.v_curr.nrows(), 1);
                self.operator
                    .apply(next.as_mut(), self.v_curr.as_ref(), Par::Seq, stack);
                self.v_prev = std::mem::replace(&mut self.v_curr, next.clone());
                next
            }
            // T_{k+1}(H)·v = 2H·(T_k(H)·v) - T_{k-1}(H)·v.
            _ => {
                let mut hv = Mat::zeros(self.v_curr.nrows(), 1);
                self.operator
                    .apply(hv.as_mut(), self.v_curr.as_ref(), Par::Seq, stack);
                let scaled = &hv * Scale(c64::new(2.0, 0.0));
                let next = &scaled - &self.v_prev;
                self.v_prev = std::mem::replace(&mut self.v_curr, next.clone());
                next
            }
        };

        self.position += 1;
        Ok(produced)
    }

    /// Produces the next `count` vectors, consuming `count` advances of the
    /// same cursor.
    ///
    /// A later call to `advance` (or `advance_many`) continues from where this
    /// batch stopped, not from the first element.
    pub fn advance_many(
        &mut self,
        count: usize,
        stack: &mut MemStack,
    ) -> Result<Vec<Mat<c64>>, SpectralError> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.advance(stack)?);
        }
        Ok(out)
    }
}

/// A truncated Chebyshev expansion `q(x) = Σ_k c_k · T_k(x)` of a scalar
/// function.
///
/// This is the concrete carrier for the scalar factor `q` of a separable
/// approximation: it can be evaluated at a point on the spectrum
/// ([`ChebyshevSeries::eval`], used by the dense reference evaluator) and
/// applied to a vector through the operator `H`
/// ([`ChebyshevSeries::apply`], which drives a [`ChebyshevStream`] over the
/// same recurrence the windowed evaluator uses).
#[derive(Clone, Debug, PartialEq)]
pub struct ChebyshevSeries {
    coeffs: Vec<c64>,
}

impl ChebyshevSeries {
    /// Builds a series from coefficients `c_0, c_1, ...` of `T_0, T_1, ...`.
    pub fn new(coeffs: Vec<c64>) -> Self {
        Self { coeffs }
    }

    /// Number of retained terms of the expansion.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// Whether the series has no terms (it then evaluates to zero).
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// The expansion coefficients.
    pub fn coeffs(&self) -> &[c64] {
        &self.coeffs
    }

    /// Evaluates the series at a scalar point via the three-term recurrence.
    pub fn eval(&self, x: f64) -> c64 {
        let mut total = c64::new(0.0, 0.0);
        let mut t_prev = 1.0f64;
        let mut t_curr = x;
        for (k, &c) in self.coeffs.iter().enumerate() {
            let t_k = match k {
                0 => 1.0,
                1 => x,
                _ => {
                    let t_next = 2.0 * x * t_curr - t_prev;
                    t_prev = t_curr;
                    t_curr = t_next;
                    t_next
                }
            };
            total += c * t_k;
        }
        total
    }

    /// Computes `q(H)·v` by accumulating the streamed recurrence vectors.
    pub fn apply<O: LinOp<c64>>(
        &self,
        operator: &O,
        v: MatRef<'_, c64>,
        stack: &mut MemStack,
    ) -> Result<Mat<c64>, SpectralError> {
        let mut stream = ChebyshevStream::new(operator, v, self.coeffs.len())?;
        let mut acc = Mat::zeros(v.nrows(), 1);
        for &c in &self.coeffs {
            let t_k = stream.advance(stack)?;
            let term = &t_k * Scale(c);
            acc = &acc + &term;
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::dyn_stack::{MemBuffer, MemStack};

    fn c(re: f64, im: f64) -> c64 {
        c64::new(re, im)
    }

    /// Scalar Chebyshev polynomial `T_k(x)` by direct recurrence.
    fn cheb_t(k: usize, x: f64) -> f64 {
        let (mut prev, mut curr) = (1.0, x);
        match k {
            0 => 1.0,
            1 => x,
            _ => {
                for _ in 2..=k {
                    let next = 2.0 * x * curr - prev;
                    prev = curr;
                    curr = next;
                }
                curr
            }
        }
    }

    /// A diagonal operator makes every streamed vector analytically known:
    /// `(T_k(H)·v)_i = T_k(d_i) · v_i`.
    fn diagonal_operator(diag: &[f64]) -> Mat<c64> {
        Mat::from_fn(diag.len(), diag.len(), |i, j| {
            if i == j {
                c(diag[i], 0.0)
            } else {
                c(0.0, 0.0)
            }
        })
    }

    #[test]
    fn stream_matches_explicit_polynomials_on_diagonal_operator() {
        let diag = [0.9, -0.4, 0.1, 0.75, -0.8];
        let h = diagonal_operator(&diag);
        let h_ref = h.as_ref();
        let seed = Mat::from_fn(diag.len(), 1, |i, _| c(0.3 + 0.1 * i as f64, 0.2));

        let mut mem = MemBuffer::new(h_ref.apply_scratch(1, Par::Seq));
        let stack = MemStack::new(&mut mem);

        let mut stream = ChebyshevStream::new(&h_ref, seed.as_ref(), 6).unwrap();
        for k in 0..6 {
            let t_k = stream.advance(stack).unwrap();
            for (i, &d) in diag.iter().enumerate() {
                let expected = seed[(i, 0)] * cheb_t(k, d);
                assert!(
                    (t_k[(i, 0)] - expected).norm() < 1e-12,
                    "mismatch at degree {k}, entry {i}"
                );
            }
        }
        assert_eq!(stream.position(), 6);
    }

    #[test]
    fn batch_and_single_pulls_share_one_cursor() {
        let diag = [0.5, -0.25, 0.6, 0.05];
        let h = diagonal_operator(&diag);
        let h_ref = h.as_ref();
        let seed = Mat::from_fn(diag.len(), 1, |i, _| c(1.0 / (1.0 + i as f64), 0.0));

        let mut mem = MemBuffer::new(h_ref.apply_scratch(1, Par::Seq));
        let stack = MemStack::new(&mut mem);

        // Drain one stream entirely in single steps as the reference order.
        let mut reference = ChebyshevStream::new(&h_ref, seed.as_ref(), 7).unwrap();
        let expected = reference.advance_many(7, stack).unwrap();

        // Interleave a batch pull with single pulls on a second stream.
        let mut stream = ChebyshevStream::new(&h_ref, seed.as_ref(), 7).unwrap();
        let head = stream.advance_many(3, stack).unwrap();
        assert_eq!(stream.position(), 3);
        let fourth = stream.advance(stack).unwrap();
        let tail = stream.advance_many(3, stack).unwrap();

        for (k, got) in head
            .iter()
            .chain(std::iter::once(&fourth))
            .chain(tail.iter())
            .enumerate()
        {
            assert!(
                (got.as_ref() - expected[k].as_ref()).norm_l2() < 1e-13,
                "resumed element {k} diverged from sequential order"
            );
        }
    }

    #[test]
    fn exhausted_stream_reports_an_error() {
        let h = diagonal_operator(&[0.2, 0.4]);
        let h_ref = h.as_ref();
        let seed = Mat::from_fn(2, 1, |_, _| c(1.0, 0.0));

        let mut mem = MemBuffer::new(h_ref.apply_scratch(1, Par::Seq));
        let stack = MemStack::new(&mut mem);

        let mut stream = ChebyshevStream::new(&h_ref, seed.as_ref(), 3).unwrap();
        stream.advance_many(3, stack).unwrap();

        let err = stream.advance(stack).unwrap_err();
        assert!(err.to_string().contains("exhausted"));
        // The cursor stays at the limit; repeated pulls keep failing.
        assert_eq!(stream.position(), 3);
        assert!(stream.advance(stack).is_err());
    }

    #[test]
    fn mismatched_seed_is_rejected() {
        let h = diagonal_operator(&[0.2, 0.4, 0.6]);
        let h_ref = h.as_ref();
        let seed = Mat::from_fn(2, 1, |_, _| c(1.0, 0.0));
        let err = ChebyshevStream::new(&h_ref, seed.as_ref(), 1).unwrap_err();
        assert!(err.to_string().contains("Dimension mismatch"));
    }

    #[test]
    fn series_eval_matches_term_by_term_sum() {
        let series = ChebyshevSeries::new(vec![c(1.0, 0.0), c(-0.5, 0.25), c(0.125, 0.0)]);
        for &x in &[-0.9, -0.3, 0.0, 0.42, 1.0] {
            let direct = c(1.0, 0.0) * cheb_t(0, x)
                + c(-0.5, 0.25) * cheb_t(1, x)
                + c(0.125, 0.0) * cheb_t(2, x);
            assert!((series.eval(x) - direct).norm() < 1e-14);
        }
    }

    #[test]
    fn series_apply_matches_eval_on_diagonal_operator() {
        let diag = [0.7, -0.6, 0.15, 0.3];
        let h = diagonal_operator(&diag);
        let seed = Mat::from_fn(diag.len(), 1, |i, _| c(0.5, -0.1 * i as f64));
        let series = ChebyshevSeries::new(vec![c(0.8, 0.0), c(0.3, 0.1), c(-0.05, 0.0)]);

        let mut mem = MemBuffer::new(h.as_ref().apply_scratch(1, Par::Seq));
        let stack = MemStack::new(&mut mem);

        let qv = series.apply(&h.as_ref(), seed.as_ref(), stack).unwrap();
        for (i, &d) in diag.iter().enumerate() {
            let expected = series.eval(d) * seed[(i, 0)];
            assert!((qv[(i, 0)] - expected).norm() < 1e-12);
        }
    }
}
