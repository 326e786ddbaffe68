//! Core registration RANSAC traits and pipeline.
//!
//! The loop is split along the same seams as any RANSAC variant:
//! - [`TransformEstimator`] fits a hypothesis from a minimal sample,
//! - [`Sampler`] draws minimal samples from an injected random generator,
//! - [`Scoring`] measures the support of a hypothesis,
//! - [`TerminationCriterion`] shrinks the iteration budget as support grows.
//!
//! [`RegistrationRansac`] orchestrates them.

use std::time::Instant;

use log::{debug, trace, warn};
use rand::Rng;

use crate::error::{RegistrationError, Result};
use crate::samplers::UniformRandomSampler;
use crate::scoring::Score;
use crate::settings::RansacParams;
use crate::types::{CorrespondenceSet, Point, PointCloud};

/// Estimator responsible for generating transform hypotheses from samples.
pub trait TransformEstimator {
    /// Model type produced by this estimator.
    type Model: Clone;

    /// Minimum number of correspondences the estimator needs.
    fn sample_size(&self) -> usize;

    /// Estimate the transform mapping `source[i]` onto `target[i]`.
    ///
    /// Returns [`RegistrationError::DegenerateSample`] when the points do not
    /// determine a unique transform.
    fn estimate(&self, source: &[Point], target: &[Point]) -> Result<Self::Model>;
}

/// Sampler responsible for drawing minimal samples of correspondence
/// positions.
pub trait Sampler {
    /// Fill `out_indices` with distinct positions in `[0, population)`.
    ///
    /// Returns `false` if no valid sample could be drawn; the loop counts the
    /// iteration and moves on.
    fn sample<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        population: usize,
        out_indices: &mut [usize],
    ) -> bool;
}

/// Scoring strategy measuring how many correspondences a hypothesis explains.
pub trait Scoring<M> {
    /// Score `model` and write the positions of consistent correspondences
    /// into `inliers_out` (cleared first).
    fn score(
        &mut self,
        model: &M,
        source: &PointCloud,
        target: &PointCloud,
        correspondences: &CorrespondenceSet,
        inliers_out: &mut Vec<usize>,
    ) -> Result<Score>;
}

/// Termination criterion deciding when the RANSAC loop can stop.
pub trait TerminationCriterion {
    /// Called whenever the best support improves.
    ///
    /// May lower `budget`, but never below `iterations_spent`. Returns `true`
    /// when no further hypothesis can improve on the current best and the loop
    /// must stop immediately.
    fn check(
        &mut self,
        best_support: usize,
        total: usize,
        sample_size: usize,
        iterations_spent: usize,
        budget: &mut usize,
    ) -> bool;

    /// Confidence level this criterion targets, if it has one.
    ///
    /// Checked to lie in (0, 1) before a run starts.
    fn confidence(&self) -> Option<f64> {
        None
    }
}

/// Number of iterations needed to draw at least one all-inlier sample with
/// probability `confidence`, given the inlier `ratio`:
/// `ceil(log(1 - confidence) / log(1 - ratio^sample_size))`.
///
/// The result is clamped to `[iterations_spent, current_budget]`, so the
/// budget never grows and never invalidates iterations already run. Inputs
/// for which the formula is undefined (`ratio` outside (0, 1), `confidence`
/// outside (0, 1), `ratio^sample_size` rounding to 0 or 1) leave the budget
/// unchanged.
pub fn next_budget(
    current_budget: usize,
    iterations_spent: usize,
    ratio: f64,
    sample_size: usize,
    confidence: f64,
) -> usize {
    let unchanged = current_budget.max(iterations_spent);
    if sample_size == 0
        || !(ratio > 0.0 && ratio < 1.0)
        || !(confidence > 0.0 && confidence < 1.0)
    {
        return unchanged;
    }

    let p_good_sample = ratio.powi(sample_size as i32);
    if p_good_sample <= 0.0 || p_good_sample >= 1.0 {
        return unchanged;
    }

    let log_one_minus_p = (-p_good_sample).ln_1p();
    let log_one_minus_conf = (-confidence).ln_1p();
    if !(log_one_minus_p < 0.0) || !log_one_minus_conf.is_finite() {
        return unchanged;
    }

    let required = (log_one_minus_conf / log_one_minus_p).ceil();
    if !required.is_finite() {
        return unchanged;
    }

    // Float-to-int `as` saturates, so huge values land on usize::MAX.
    let required = (required.max(1.0)) as usize;
    required.min(current_budget).max(iterations_spent)
}

/// Standard RANSAC adaptive termination.
///
/// Stops outright on perfect support (or an inlier ratio so close to one that
/// `ratio^sample_size` rounds to one); otherwise shrinks the budget with
/// [`next_budget`].
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveTermination {
    /// Desired confidence in (0, 1).
    pub confidence: f64,
}

impl AdaptiveTermination {
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }
}

impl TerminationCriterion for AdaptiveTermination {
    fn check(
        &mut self,
        best_support: usize,
        total: usize,
        sample_size: usize,
        iterations_spent: usize,
        budget: &mut usize,
    ) -> bool {
        if total == 0 {
            return false;
        }
        // No data can support more than all of it.
        if best_support >= total {
            return true;
        }

        let ratio = best_support as f64 / total as f64;
        let p_good_sample = ratio.powi(sample_size as i32);
        if 1.0 - p_good_sample <= f64::EPSILON {
            return true;
        }

        *budget = next_budget(
            *budget,
            iterations_spent,
            ratio,
            sample_size,
            self.confidence,
        );
        false
    }

    fn confidence(&self) -> Option<f64> {
        Some(self.confidence)
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The (possibly shrunk) iteration budget was used up.
    BudgetExhausted,
    /// Every correspondence supported the best hypothesis.
    PerfectSupport,
    /// `RansacParams::time_limit` elapsed; the result is the best so far.
    TimeLimit,
}

/// Outcome of a registration run.
#[derive(Debug, Clone)]
pub struct RansacOutput<M> {
    /// Positions (into the correspondence set) of the best inlier set.
    pub inliers: Vec<usize>,
    /// Size of `inliers`.
    pub support: usize,
    /// Best hypothesis, refit on its inliers when refinement is enabled.
    /// `None` when no hypothesis gained any support.
    pub model: Option<M>,
    /// Number of iterations executed, degenerate ones included.
    pub iterations: usize,
    pub stop_reason: StopReason,
}

/// Per-call mutable state; never outlives a single `run`.
struct RunState<M> {
    best_inliers: Vec<usize>,
    best_support: usize,
    best_model: Option<M>,
    iteration: usize,
    budget: usize,
}

impl<M> RunState<M> {
    fn new(budget: usize) -> Self {
        Self {
            best_inliers: Vec::new(),
            best_support: 0,
            best_model: None,
            iteration: 0,
            budget,
        }
    }
}

/// RANSAC pipeline for filtering 3D correspondences.
///
/// The pipeline itself holds only configuration and collaborators; all run
/// state lives inside [`run`](Self::run), so one instance can be reused for
/// any number of sequential runs.
#[derive(Debug)]
pub struct RegistrationRansac<E, Sc, Sa = UniformRandomSampler, T = AdaptiveTermination>
where
    E: TransformEstimator,
    Sc: Scoring<E::Model>,
    Sa: Sampler,
    T: TerminationCriterion,
{
    pub params: RansacParams,
    pub estimator: E,
    pub scoring: Sc,
    pub sampler: Sa,
    pub termination: T,
}

impl<E, Sc> RegistrationRansac<E, Sc>
where
    E: TransformEstimator,
    Sc: Scoring<E::Model>,
{
    /// Pipeline with uniform sampling and adaptive termination at
    /// `params.confidence`.
    pub fn with_defaults(params: RansacParams, estimator: E, scoring: Sc) -> Self {
        let termination = AdaptiveTermination::new(params.confidence);
        Self::new(params, estimator, scoring, UniformRandomSampler, termination)
    }
}

impl<E, Sc, Sa, T> RegistrationRansac<E, Sc, Sa, T>
where
    E: TransformEstimator,
    Sc: Scoring<E::Model>,
    Sa: Sampler,
    T: TerminationCriterion,
{
    /// Create a new pipeline from its components.
    ///
    /// `termination` carries its own confidence; `params.confidence` is only
    /// read by [`with_defaults`](RegistrationRansac::with_defaults). Both are
    /// checked to lie in (0, 1) when a run starts.
    pub fn new(
        params: RansacParams,
        estimator: E,
        scoring: Sc,
        sampler: Sa,
        termination: T,
    ) -> Self {
        Self {
            params,
            estimator,
            scoring,
            sampler,
            termination,
        }
    }

    fn validate(
        &self,
        correspondences: &CorrespondenceSet,
        source: &PointCloud,
        target: &PointCloud,
    ) -> Result<()> {
        self.params.validate(correspondences.len())?;
        let minimal = self.estimator.sample_size();
        if self.params.sample_size < minimal {
            return Err(RegistrationError::invalid(format!(
                "sample size {} is below the estimator minimum of {minimal}",
                self.params.sample_size
            )));
        }
        if let Some(confidence) = self.termination.confidence() {
            if !(confidence > 0.0 && confidence < 1.0) {
                return Err(RegistrationError::invalid(format!(
                    "termination confidence must be in (0, 1), got {confidence}"
                )));
            }
        }
        correspondences.check_bounds(source.len(), target.len())
    }

    /// Run the RANSAC loop.
    ///
    /// Fails only on invalid inputs or when support cannot be evaluated
    /// (`EmptyCloud`). Degenerate samples are skipped but still consume an
    /// iteration. An empty inlier set with zero support is a valid result.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        correspondences: &CorrespondenceSet,
        source: &PointCloud,
        target: &PointCloud,
        rng: &mut R,
    ) -> Result<RansacOutput<E::Model>> {
        self.validate(correspondences, source, target)?;

        let n = correspondences.len();
        let sample_size = self.params.sample_size;
        let deadline = self.params.time_limit.map(|limit| Instant::now() + limit);

        let mut sample = vec![0usize; sample_size];
        let mut sample_source = Vec::with_capacity(sample_size);
        let mut sample_target = Vec::with_capacity(sample_size);
        let mut tmp_inliers = Vec::with_capacity(n);

        let mut state = RunState::new(self.params.max_iterations);
        let mut stop_reason = StopReason::BudgetExhausted;

        while state.iteration < state.budget {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(
                    "registration RANSAC timed out after {} iterations (best support {}/{})",
                    state.iteration, state.best_support, n
                );
                stop_reason = StopReason::TimeLimit;
                break;
            }

            if !self.sampler.sample(rng, n, &mut sample) {
                state.iteration += 1;
                continue;
            }

            correspondences.gather(
                &sample,
                source,
                target,
                &mut sample_source,
                &mut sample_target,
            );
            let model = match self.estimator.estimate(&sample_source, &sample_target) {
                Ok(model) => model,
                Err(RegistrationError::DegenerateSample(reason)) => {
                    trace!(
                        "iteration {}: degenerate sample {:?}: {}",
                        state.iteration,
                        sample,
                        reason
                    );
                    state.iteration += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let score = self
                .scoring
                .score(&model, source, target, correspondences, &mut tmp_inliers)?;

            if score.inlier_count > state.best_support {
                state.best_support = score.inlier_count;
                std::mem::swap(&mut state.best_inliers, &mut tmp_inliers);
                state.best_model = Some(model);

                let previous_budget = state.budget;
                let terminate = self.termination.check(
                    state.best_support,
                    n,
                    sample_size,
                    state.iteration + 1,
                    &mut state.budget,
                );
                debug!(
                    "iteration {}: support improved to {}/{}, budget {} -> {}",
                    state.iteration, state.best_support, n, previous_budget, state.budget
                );
                if terminate {
                    state.iteration += 1;
                    stop_reason = StopReason::PerfectSupport;
                    break;
                }
            }

            state.iteration += 1;
        }

        if self.params.refine && state.best_support >= self.estimator.sample_size() {
            correspondences.gather(
                &state.best_inliers,
                source,
                target,
                &mut sample_source,
                &mut sample_target,
            );
            match self.estimator.estimate(&sample_source, &sample_target) {
                Ok(refined) => state.best_model = Some(refined),
                Err(e) => debug!(
                    "refit on {} inliers failed, keeping sampled model: {}",
                    state.best_support, e
                ),
            }
        }

        debug!(
            "registration RANSAC stopped ({:?}) after {} iterations with support {}/{}",
            stop_reason, state.iteration, state.best_support, n
        );

        Ok(RansacOutput {
            inliers: state.best_inliers,
            support: state.best_support,
            model: state.best_model,
            iterations: state.iteration,
            stop_reason,
        })
    }
}
