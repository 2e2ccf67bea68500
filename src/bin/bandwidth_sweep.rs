//! Experiment runner for the window-bandwidth sweep.
//!
//! This executable measures how the windowed trace evaluation behaves as the
//! window half-width grows: the computed value converges to the full-band
//! result while the peak memory footprint grows with the window. To obtain an
//! isolated peak-RSS reading per bandwidth, the orchestrator process spawns
//! one worker child per bandwidth value; workers print their result row as
//! headerless CSV on stdout and the orchestrator consolidates all rows into a
//! single output file.

use anyhow::{Context, Result, anyhow};
use cheb_window::{
    SeparableApprox,
    algorithms::ChebyshevSeries,
    utils::perf::peak_rss_kb,
};
use clap::Parser;
use faer::{
    Mat, Par, c64,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::LinOp,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{
    path::PathBuf,
    process::{Command, Stdio},
    time::Instant,
};

/// An environment variable used for internal communication between the
/// orchestrator process and the worker child processes. Its value is the
/// bandwidth the worker should evaluate.
const BANDWIDTH_ENV_VAR: &str = "CHEB_SWEEP_BANDWIDTH";

/// Command-line arguments for the bandwidth sweep.
#[derive(Parser, Debug)]
#[clap(
    name = "bandwidth-sweep",
    about = "Sweeps the window bandwidth of the Chebyshev trace evaluator and records value, time, and peak RSS."
)]
struct SweepArgs {
    /// Dimension N of the test operators.
    #[clap(long, default_value_t = 256)]
    n_site: usize,
    /// Degree n of the coefficient matrix.
    #[clap(long, default_value_t = 64)]
    degree: usize,
    /// First bandwidth of the sweep.
    #[clap(long, default_value_t = 0)]
    bandwidth_start: usize,
    /// Last bandwidth of the sweep; defaults to degree - 1 (the full band).
    #[clap(long)]
    bandwidth_end: Option<usize>,
    /// Step between successive bandwidths.
    #[clap(long, default_value_t = 4)]
    bandwidth_step: usize,
    /// Seed for the deterministic test problem.
    #[clap(long, default_value_t = 42)]
    seed: u64,
    /// Path to the output CSV file where results will be written.
    #[clap(long)]
    output: PathBuf,
}

/// Represents a single row of data produced by a worker process.
#[derive(Debug, Serialize, Deserialize)]
struct SweepResult {
    bandwidth: usize,
    value_re: f64,
    value_im: f64,
    time_s: f64,
    rss_kb: u64,
}

/// The deterministic test problem shared by every worker: a nearest-neighbor
/// hopping Hamiltonian (spectrum inside [-1, 1]), random complex weight and
/// source operators, a coefficient matrix with exponential off-diagonal
/// decay, and a low-degree scalar factor.
fn build_problem(args: &SweepArgs) -> Result<(Mat<c64>, Mat<c64>, Mat<c64>, SeparableApprox)> {
    let n_site = args.n_site;
    let h = Mat::from_fn(n_site, n_site, |i, j| {
        if (i as isize - j as isize).abs() == 1 {
            c64::new(0.5, 0.0)
        } else {
            c64::new(0.0, 0.0)
        }
    });

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut random_mat = |n: usize| {
        Mat::from_fn(n, n, |_, _| {
            c64::new(rng.random::<f64>() - 0.5, rng.random::<f64>() - 0.5)
        })
    };
    let da = random_mat(n_site);
    let db = random_mat(n_site);

    let core = Mat::from_fn(args.degree, args.degree, |i, j| {
        let distance = (i as isize - j as isize).unsigned_abs() as f64;
        let decay = (-0.5 * distance).exp();
        c64::new(decay / (1.0 + (i + j) as f64), 0.0)
    });
    let factor = ChebyshevSeries::new(vec![
        c64::new(1.0, 0.0),
        c64::new(0.4, 0.0),
        c64::new(0.15, 0.0),
    ]);
    let approx = SeparableApprox::new(core, factor.clone(), factor)?;

    Ok((h, da, db, approx))
}

/// The main entry point.
/// It distinguishes between being the orchestrator or a worker based on an
/// environment variable.
fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    if let Ok(bandwidth_str) = std::env::var(BANDWIDTH_ENV_VAR) {
        let bandwidth: usize = bandwidth_str
            .parse()
            .map_err(|_| anyhow!("Invalid bandwidth in env var: {}", bandwidth_str))?;
        run_worker(bandwidth)
    } else {
        run_orchestrator()
    }
}

/// Spawns one worker per bandwidth and consolidates their CSV rows.
fn run_orchestrator() -> Result<()> {
    let args = SweepArgs::parse();
    let bandwidth_end = args.bandwidth_end.unwrap_or(args.degree.saturating_sub(1));
    log::info!(
        "Orchestrator sweeping bandwidth {}..={} (step {}) for N = {}, n = {}...",
        args.bandwidth_start,
        bandwidth_end,
        args.bandwidth_step,
        args.n_site,
        args.degree
    );

    let bandwidths: Vec<usize> = (args.bandwidth_start..=bandwidth_end)
        .step_by(args.bandwidth_step.max(1))
        .collect();

    let mut all_results = Vec::new();
    for &bandwidth in &bandwidths {
        log::info!("Spawning worker for bandwidth {bandwidth}...");
        let current_exe = std::env::current_exe()?;
        let output = Command::new(current_exe)
            .args(std::env::args_os().skip(1))
            .env(BANDWIDTH_ENV_VAR, bandwidth.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to spawn worker for bandwidth {bandwidth}"))?
            .wait_with_output()?;

        if !output.status.success() {
            return Err(anyhow!(
                "Worker process for bandwidth {} failed with status: {}",
                bandwidth,
                output.status
            ));
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(output.stdout.as_slice());
        for result in rdr.deserialize() {
            let record: SweepResult = result?;
            all_results.push(record);
        }
    }

    // The widest window of the sweep serves as the in-sweep reference value.
    if let Some(reference) = all_results.last() {
        let reference_value = c64::new(reference.value_re, reference.value_im);
        for record in &all_results {
            let deviation = (c64::new(record.value_re, record.value_im) - reference_value).norm();
            log::info!(
                "bandwidth {:>4}: value = {:+.6e} {:+.6e}i, |Δ| vs widest = {:.3e}, rss = {} kB",
                record.bandwidth,
                record.value_re,
                record.value_im,
                deviation,
                record.rss_kb
            );
        }
    }

    log::info!("Consolidating results into {:?}...", &args.output);
    let mut writer = csv::Writer::from_path(&args.output)?;
    for record in all_results {
        writer.serialize(record)?;
    }
    writer.flush()?;

    log::info!("Sweep complete.");
    Ok(())
}

/// Evaluates the trace at a single bandwidth and prints the result row as CSV
/// on stdout, which is captured by the orchestrator.
fn run_worker(bandwidth: usize) -> Result<()> {
    let args = SweepArgs::parse();
    log::info!("Worker for bandwidth {bandwidth} started.");

    let (h, da, db, approx) = build_problem(&args)?;

    let mut mem = MemBuffer::new(h.as_ref().apply_scratch(1, Par::Seq));
    let stack = MemStack::new(&mut mem);

    let start_time = Instant::now();
    let value = approx.evaluate(&h.as_ref(), da.as_ref(), db.as_ref(), bandwidth, stack)?;
    let time_s = start_time.elapsed().as_secs_f64();

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(std::io::stdout());
    writer.serialize(SweepResult {
        bandwidth,
        value_re: value.re,
        value_im: value.im,
        time_s,
        rss_kb: peak_rss_kb(),
    })?;
    writer.flush()?;

    log::info!("Worker for bandwidth {bandwidth} finished.");
    Ok(())
}
