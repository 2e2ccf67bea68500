//! High-level evaluators for the bilinear spectral trace.
//!
//! The quantity computed here is
//!
//! ```text
//! (1/N) · Σ_{i2=1}^{n} Σ_{i1} C[i1,i2] · (T_{i1}(H)·v1)ᴴ · Da · (T_{i2}(H)·v2)
//! ```
//!
//! with `v1 = q(H)·e1` and `v2 = q(H)·Db[:,0]`, where the inner sum runs only
//! over `|i1 - i2| <= bandwidth`. Entries of `C` outside that band are assumed
//! negligible by construction of the separable approximation and are never
//! dereferenced.
//!
//! Materializing all `n` transformed vectors for both seeds costs `O(n·N)`
//! memory. [`trace_windowed`] instead advances two Chebyshev recurrence
//! streams at different paces and keeps only a sliding window of at most
//! `min(n, 2·bandwidth + 1)` vectors from the `v1` side, for a peak footprint
//! of `O(min(n, 2·bandwidth + 1)·N)` beyond the inputs. Across one evaluation
//! each stream is pulled exactly `n` times, independent of `bandwidth`.
//!
//! [`trace_reference_dense`] computes the same quantity by full
//! eigendecomposition and serves purely as a correctness oracle; it costs
//! `O(N³)` and is not memory-bounded.

use crate::{
    algorithms::{ChebyshevSeries, ChebyshevStream, DegreeWindow},
    error::{SpectralError, SpectralErrorKind},
};
use faer::{
    Accum, Side, c64,
    dyn_stack::MemStack,
    linalg::matmul::matmul,
    matrix_free::LinOp,
    prelude::*,
};

/// Checks that a dense matrix has the expected shape, reporting `context` in
/// the error.
fn ensure_shape(
    context: &'static str,
    mat: MatRef<'_, c64>,
    rows: usize,
    cols: usize,
) -> Result<(), SpectralError> {
    if mat.nrows() != rows || mat.ncols() != cols {
        return Err(SpectralErrorKind::DimensionMismatch {
            context,
            expected_rows: rows,
            expected_cols: cols,
            actual_rows: mat.nrows(),
            actual_cols: mat.ncols(),
        }
        .into());
    }
    Ok(())
}

/// Computes the banded bilinear spectral trace with a bounded sliding window.
///
/// # Arguments
/// * `operator`: the Hermitian operator `H`, as a matrix-free
///   [`faer::matrix_free::LinOp`]. Must be square, `N×N`.
/// * `weight`: the bilinear-form weight `Da`, `N×N`.
/// * `source`: `Db`, `N×N`; only its first column is read, as the seed of the
///   second recurrence.
/// * `coeffs`: the coefficient matrix `C` of the separable approximation,
///   square `n×n`. Only entries within `bandwidth` of the diagonal are read.
/// * `factor`: the scalar factor `q`, applied as `v ↦ q(H)·v` to each of the
///   two seed vectors before streaming begins. Both sides of the bilinear
///   form must share the same factor; see [`SeparableApprox`].
/// * `bandwidth`: half-width of the retained band of `C`. `bandwidth >= n` is
///   valid and simply means no vector is ever evicted.
/// * `stack`: workspace for operator applications, sized by
///   `operator.apply_scratch(1, Par::Seq)`.
///
/// # Returns
/// The complex scalar `Σ / N`, or a [`SpectralError`] if a precondition fails.
/// All shape checks run eagerly, before `factor` is invoked or any stream is
/// created.
pub fn trace_windowed<O, Q>(
    operator: &O,
    weight: MatRef<'_, c64>,
    source: MatRef<'_, c64>,
    coeffs: MatRef<'_, c64>,
    mut factor: Q,
    bandwidth: usize,
    stack: &mut MemStack,
) -> Result<c64, SpectralError>
where
    O: LinOp<c64>,
    Q: FnMut(MatRef<'_, c64>, &mut MemStack) -> Result<Mat<c64>, anyhow::Error>,
{
    // --- Eager precondition checks ---
    let n_site = operator.nrows();
    if operator.ncols() != n_site {
        return Err(SpectralErrorKind::DimensionMismatch {
            context: "operator H",
            expected_rows: n_site,
            expected_cols: n_site,
            actual_rows: operator.nrows(),
            actual_cols: operator.ncols(),
        }
        .into());
    }
    if n_site == 0 {
        return Err(SpectralErrorKind::InputError(
            "The operator H must not be empty.".to_string(),
        )
        .into());
    }
    ensure_shape("weight operator Da", weight, n_site, n_site)?;
    ensure_shape("source operator Db", source, n_site, n_site)?;

    let n_deg = coeffs.nrows();
    if coeffs.ncols() != n_deg {
        return Err(SpectralErrorKind::DimensionMismatch {
            context: "coefficient matrix C",
            expected_rows: n_deg,
            expected_cols: n_deg,
            actual_rows: coeffs.nrows(),
            actual_cols: coeffs.ncols(),
        }
        .into());
    }
    if n_deg == 0 {
        return Err(SpectralErrorKind::InputError(
            "The coefficient matrix must not be empty.".to_string(),
        )
        .into());
    }

    // --- Seed vectors: v1 = q(H)·e1, v2 = q(H)·Db[:,0] ---
    let mut e1 = Mat::<c64>::zeros(n_site, 1);
    e1.as_mut()[(0, 0)] = c64::new(1.0, 0.0);

    let v1 = factor(e1.as_ref(), stack)
        .map_err(|e| SpectralError::from(SpectralErrorKind::Factor(e.to_string())))?;
    ensure_shape("scalar factor output for v1", v1.as_ref(), n_site, 1)?;

    let v2 = factor(source.get(.., 0..1), stack)
        .map_err(|e| SpectralError::from(SpectralErrorKind::Factor(e.to_string())))?;
    ensure_shape("scalar factor output for v2", v2.as_ref(), n_site, 1)?;

    // Both streams are bounded to n pulls; together with the admission rule
    // below this guarantees the exactly-n-pulls invariant per stream.
    let mut stream1 = ChebyshevStream::new(operator, v1.as_ref(), n_deg)?;
    let mut stream2 = ChebyshevStream::new(operator, v2.as_ref(), n_deg)?;

    // Prime the window with the first min(bandwidth, n) v1-side vectors.
    let mut window = DegreeWindow::new();
    for vector in stream1.advance_many(bandwidth.min(n_deg), stack)? {
        window.push(vector);
    }

    let mut weighted = Mat::<c64>::zeros(n_site, 1);
    let mut term = Mat::<c64>::zeros(1, 1);
    let mut total = c64::new(0.0, 0.0);

    for i2 in 1..=n_deg {
        let tv2 = stream2.advance(stack)?;

        // Da · (T_{i2}(H)·v2), reused against every cached v1-side vector.
        matmul(
            weighted.as_mut(),
            Accum::Replace,
            weight,
            tv2.as_ref(),
            c64::new(1.0, 0.0),
            Par::Seq,
        );

        // Evict the vector that has fallen more than `bandwidth` behind i2,
        // then admit the next one so the window reaches `bandwidth` ahead.
        // The order matters: evict before insert.
        if i2 > bandwidth + 1 {
            window.evict_oldest();
        }
        if i2 + bandwidth <= n_deg {
            window.push(stream1.advance(stack)?);
        }

        // Lowest degree that can still pair with i2 inside the band.
        let band_floor = i2.saturating_sub(bandwidth).max(1);
        debug_assert_eq!(window.lowest_degree(), Some(band_floor));
        debug_assert!(window.len() <= (2 * bandwidth + 1).min(n_deg));

        for (degree, tv1) in window.iter() {
            // The coefficient scalar rides along as the matmul alpha, so each
            // term accumulates without intermediate allocations.
            let c = coeffs[(degree - 1, i2 - 1)];
            matmul(
                term.as_mut(),
                Accum::Replace,
                tv1.as_ref().adjoint(),
                weighted.as_ref(),
                c,
                Par::Seq,
            );
            total += term[(0, 0)];
        }
    }

    Ok(total * c64::new(1.0 / n_site as f64, 0.0))
}

/// The output contract of the external separable-approximation builder: the
/// 2-D core coefficient matrix `C` together with the scalar factor `q`, such
/// that the target function is approximated by `q(x1)·q(x2)·p(x1,x2)` with
/// `p`'s coefficients being `C`.
///
/// The windowed evaluator's coefficient indexing assumes both sides of the
/// bilinear form share the same factor, so the constructor takes the two
/// factor specifications separately and rejects any asymmetric pair.
#[derive(Clone, Debug)]
pub struct SeparableApprox {
    core: Mat<c64>,
    factor: ChebyshevSeries,
}

impl SeparableApprox {
    /// Bundles a core coefficient matrix with its scalar factor.
    ///
    /// Fails with a factor-mismatch error unless `factor_left` and
    /// `factor_right` are identical, and with a dimension error if `core` is
    /// not square.
    pub fn new(
        core: Mat<c64>,
        factor_left: ChebyshevSeries,
        factor_right: ChebyshevSeries,
    ) -> Result<Self, SpectralError> {
        if factor_left != factor_right {
            return Err(SpectralErrorKind::FactorMismatch.into());
        }
        if core.nrows() != core.ncols() {
            return Err(SpectralErrorKind::DimensionMismatch {
                context: "coefficient matrix C",
                expected_rows: core.nrows(),
                expected_cols: core.nrows(),
                actual_rows: core.nrows(),
                actual_cols: core.ncols(),
            }
            .into());
        }
        Ok(Self {
            core,
            factor: factor_left,
        })
    }

    /// The core coefficient matrix `C`.
    pub fn core(&self) -> MatRef<'_, c64> {
        self.core.as_ref()
    }

    /// The shared scalar factor `q`.
    pub fn factor(&self) -> &ChebyshevSeries {
        &self.factor
    }

    /// Evaluates the windowed trace for this approximation, adapting the
    /// stored [`ChebyshevSeries`] into the factor closure of
    /// [`trace_windowed`].
    pub fn evaluate<O: LinOp<c64>>(
        &self,
        operator: &O,
        weight: MatRef<'_, c64>,
        source: MatRef<'_, c64>,
        bandwidth: usize,
        stack: &mut MemStack,
    ) -> Result<c64, SpectralError> {
        let factor = &self.factor;
        trace_windowed(
            operator,
            weight,
            source,
            self.core.as_ref(),
            |v: MatRef<'_, c64>, stack: &mut MemStack| Ok(factor.apply(operator, v, stack)?),
            bandwidth,
            stack,
        )
    }
}

/// Computes the trace quantity by dense eigendecomposition, as an independent
/// correctness oracle.
///
/// Given `H = U·Λ·Uᴴ`, the quantity equals
///
/// ```text
/// (1/N) · Σ_{a,b} conj(w1_a) · f(λ_a, λ_b) · (Uᴴ·Da·U)_{ab} · w2_b
/// ```
///
/// with `w1 = Uᴴ·e1`, `w2 = Uᴴ·Db[:,0]`, where `f` is the original
/// (non-separable) target function evaluated on the eigenvalue product grid.
/// `f` must absorb the scalar factors, i.e. `f(x,y) = conj(q(x))·q(y)·p(x,y)`
/// when comparing against [`trace_windowed`].
///
/// Cost is `O(N³)` time and `O(N²)` memory; this is not part of the windowed
/// algorithm and exists only as ground truth for testing it.
pub fn trace_reference_dense<F>(
    operator: MatRef<'_, c64>,
    weight: MatRef<'_, c64>,
    source: MatRef<'_, c64>,
    mut f: F,
) -> Result<c64, SpectralError>
where
    F: FnMut(f64, f64) -> c64,
{
    let n_site = operator.nrows();
    if operator.ncols() != n_site || n_site == 0 {
        return Err(SpectralErrorKind::DimensionMismatch {
            context: "operator H",
            expected_rows: n_site.max(1),
            expected_cols: n_site.max(1),
            actual_rows: operator.nrows(),
            actual_cols: operator.ncols(),
        }
        .into());
    }
    ensure_shape("weight operator Da", weight, n_site, n_site)?;
    ensure_shape("source operator Db", source, n_site, n_site)?;

    let evd = operator
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| SpectralError::from(SpectralErrorKind::Evd(e)))?;
    let u = evd.U();
    let eigenvalues = evd.S();

    // Rotate the seeds and the weight into the eigenbasis.
    let mut e1 = Mat::<c64>::zeros(n_site, 1);
    e1.as_mut()[(0, 0)] = c64::new(1.0, 0.0);
    let w1 = u.adjoint() * e1.as_ref();
    let w2 = u.adjoint() * source.get(.., 0..1);
    let half_rotated = u.adjoint() * weight;
    let rotated_weight = half_rotated.as_ref() * u;

    // The eigenvalues of the Hermitian H are real; S() stores them with the
    // operator's scalar type, so only the real part is meaningful.
    let mut total = c64::new(0.0, 0.0);
    for a in 0..n_site {
        let lambda_a = eigenvalues[a].re;
        for b in 0..n_site {
            let lambda_b = eigenvalues[b].re;
            total += w1[(a, 0)].conj()
                * f(lambda_a, lambda_b)
                * rotated_weight[(a, b)]
                * w2[(b, 0)];
        }
    }

    Ok(total * c64::new(1.0 / n_site as f64, 0.0))
}
