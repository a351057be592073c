//! Sketch session: all mutable state behind one drawing surface.
//!
//! A submission is split into three steps so the caller keeps `&mut`
//! access to the session while a request is outstanding:
//!
//! 1. [`Session::begin_submission`] snapshots the strokes, runs the
//!    pipeline and claims the submission guard.
//! 2. [`PendingSubmission::send`] performs the one network call.
//! 3. [`Session::complete_submission`] stores the results and draws the
//!    best match.
//!
//! [`Session::submit`] chains the three. Snapping follows the same
//! begin/send/complete split with its own guard.
//!
//! Every pending request carries the session generation at the time it
//! began. [`Session::reset`] bumps the generation, so completions that
//! straddle a reset are discarded.

use geo::LineString;
use log::{debug, info, warn};
use mapsketch_pipeline::snap::{path_param, snap_sample};
use mapsketch_pipeline::{
    GeoBounds, GeoPoint, PipelineError, Remapper, Scale, SketchConfig, StrokePoint,
    StrokeRecorder, TracedGrid,
};

use crate::error::ClientError;
use crate::guard::{InFlight, InFlightToken};
use crate::service::{MatchService, RoadSnapper};
use crate::wire::{LocationKey, MatchRequest, MatchResponse};

/// Results of the last successful submission, together with the
/// snapshot they were computed from.
#[derive(Debug, Clone)]
pub struct MatchResults {
    best: Vec<GeoPoint>,
    scale: Scale,
    strokes: Vec<StrokePoint>,
    traced: TracedGrid,
}

impl MatchResults {
    /// Candidate anchors, best first.
    #[must_use]
    pub fn anchors(&self) -> &[GeoPoint] {
        &self.best
    }

    /// Geographic size of one grid cell.
    #[must_use]
    pub const fn scale(&self) -> Scale {
        self.scale
    }

    /// Strokes as they were when the submission began.
    #[must_use]
    pub fn strokes(&self) -> &[StrokePoint] {
        &self.strokes
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.best.len()
    }

    /// Whether the matcher found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Geographic path of the submitted strokes placed at candidate
    /// `index`, or `None` if there is no such candidate.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyShape`] if the snapshot traced
    /// nothing, which a completed submission rules out.
    pub fn path_for(&self, index: usize) -> Result<Option<LineString<f64>>, PipelineError> {
        let Some(&anchor) = self.best.get(index) else {
            return Ok(None);
        };
        let remapper = Remapper::for_grid(anchor, self.scale, &self.traced)?;
        Ok(Some(remapper.remap(&self.strokes)))
    }
}

/// A submission that has been prepared and holds the submission guard.
///
/// Dropping it without sending releases the guard.
#[derive(Debug)]
pub struct PendingSubmission {
    token: InFlightToken,
    generation: u64,
    location: LocationKey,
    request: MatchRequest,
    strokes: Vec<StrokePoint>,
    traced: TracedGrid,
}

impl PendingSubmission {
    /// The body that will be sent.
    #[must_use]
    pub const fn request(&self) -> &MatchRequest {
        &self.request
    }

    /// The location the request targets.
    #[must_use]
    pub const fn location(&self) -> &LocationKey {
        &self.location
    }

    /// Issue the match request. Exactly one call to
    /// [`MatchService::find_match`] is made.
    ///
    /// # Errors
    ///
    /// Propagates the service error. The guard is released either way
    /// once the returned value is dropped.
    pub async fn send<S>(self, service: &S) -> Result<CompletedSubmission, ClientError>
    where
        S: MatchService + ?Sized,
    {
        let response = service
            .find_match(&self.location, &self.request)
            .await
            .inspect_err(|err| warn!("match request for {} failed: {err}", self.location))?;
        Ok(CompletedSubmission {
            _token: self.token,
            generation: self.generation,
            response,
            strokes: self.strokes,
            traced: self.traced,
        })
    }
}

/// A matcher response waiting to be applied to the session.
#[derive(Debug)]
pub struct CompletedSubmission {
    _token: InFlightToken,
    generation: u64,
    response: MatchResponse,
    strokes: Vec<StrokePoint>,
    traced: TracedGrid,
}

impl CompletedSubmission {
    /// The raw matcher response.
    #[must_use]
    pub const fn response(&self) -> &MatchResponse {
        &self.response
    }
}

/// A snap request for one drawn path, holding the snap guard.
#[derive(Debug)]
pub struct PendingSnap {
    token: InFlightToken,
    generation: u64,
    original: LineString<f64>,
    samples: Vec<GeoPoint>,
}

impl PendingSnap {
    /// The thinned points that will be sent.
    #[must_use]
    pub fn samples(&self) -> &[GeoPoint] {
        &self.samples
    }

    /// The samples formatted as a `lat,lon|lat,lon` path parameter.
    #[must_use]
    pub fn path_param(&self) -> String {
        path_param(&self.samples)
    }

    /// Issue the snap request.
    ///
    /// # Errors
    ///
    /// Propagates the snapper error; the guard is released.
    pub async fn send<R>(self, snapper: &R) -> Result<CompletedSnap, ClientError>
    where
        R: RoadSnapper + ?Sized,
    {
        let snapped = snapper
            .snap(&self.samples)
            .await
            .inspect_err(|err| warn!("road snap failed: {err}"))?;
        Ok(CompletedSnap {
            _token: self.token,
            generation: self.generation,
            original: self.original,
            snapped,
        })
    }
}

/// A snapped path waiting to be applied to the session.
#[derive(Debug)]
pub struct CompletedSnap {
    _token: InFlightToken,
    generation: u64,
    original: LineString<f64>,
    snapped: Vec<GeoPoint>,
}

impl CompletedSnap {
    /// Points returned by the snapper.
    #[must_use]
    pub fn snapped(&self) -> &[GeoPoint] {
        &self.snapped
    }
}

/// State of one drawing session.
#[derive(Debug)]
pub struct Session {
    config: SketchConfig,
    recorder: StrokeRecorder,
    location: Option<LocationKey>,
    bounds: Option<GeoBounds>,
    results: Option<MatchResults>,
    paths: Vec<LineString<f64>>,
    generation: u64,
    submission: InFlight,
    snap: InFlight,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_config(SketchConfig::default())
    }
}

impl Session {
    /// A fresh session with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh session with `config`. The configuration is validated
    /// when a submission begins.
    #[must_use]
    pub fn with_config(config: SketchConfig) -> Self {
        Self {
            config,
            recorder: StrokeRecorder::new(),
            location: None,
            bounds: None,
            results: None,
            paths: Vec::new(),
            generation: 0,
            submission: InFlight::new(),
            snap: InFlight::new(),
        }
    }

    /// Return to the initial state, keeping the configuration.
    ///
    /// Requests still outstanding complete into nothing.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::with_config(self.config.clone());
        self.generation = generation;
        debug!("session reset (generation {generation})");
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SketchConfig {
        &self.config
    }

    /// Recorded strokes.
    #[must_use]
    pub const fn recorder(&self) -> &StrokeRecorder {
        &self.recorder
    }

    /// Mutable access for pointer handlers.
    pub const fn recorder_mut(&mut self) -> &mut StrokeRecorder {
        &mut self.recorder
    }

    /// Erase the sketch. Drawn paths and results are kept.
    pub fn clear_shape(&mut self) {
        self.recorder.clear();
    }

    /// The resolved location, if any.
    #[must_use]
    pub const fn location(&self) -> Option<&LocationKey> {
        self.location.as_ref()
    }

    /// The current search area, if any.
    #[must_use]
    pub const fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }

    /// Replace the search area, e.g. after the user drags its edges.
    pub const fn set_bounds(&mut self, bounds: GeoBounds) {
        self.bounds = Some(bounds);
    }

    /// Results of the last completed submission.
    #[must_use]
    pub const fn results(&self) -> Option<&MatchResults> {
        self.results.as_ref()
    }

    /// Drawn geographic paths, oldest first.
    #[must_use]
    pub fn paths(&self) -> &[LineString<f64>] {
        &self.paths
    }

    /// Remove all drawn paths.
    pub fn clear_paths(&mut self) {
        self.paths.clear();
    }

    /// Whether a submission is outstanding.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submission.is_busy()
    }

    /// Whether a snap is outstanding.
    #[must_use]
    pub fn is_snapping(&self) -> bool {
        self.snap.is_busy()
    }

    /// Look up `location` and make it the search target.
    ///
    /// The previous location and bounds are kept if the lookup fails.
    ///
    /// # Errors
    ///
    /// Propagates the service error, typically
    /// [`ClientError::LocationNotFound`].
    pub async fn pan_to_location<S>(
        &mut self,
        service: &S,
        location: &str,
    ) -> Result<GeoBounds, ClientError>
    where
        S: MatchService + ?Sized,
    {
        let key = LocationKey::new(location);
        let bounds = service
            .bounds(&key)
            .await
            .inspect_err(|err| warn!("bounds lookup for {key} failed: {err}"))?;
        info!("panned to {key}");
        self.location = Some(key);
        self.bounds = Some(bounds);
        Ok(bounds)
    }

    /// Prepare a submission from the current strokes.
    ///
    /// Returns `Ok(None)` without doing anything if a submission is
    /// already outstanding.
    ///
    /// # Errors
    ///
    /// [`ClientError::NoLocation`] before a location is resolved, and
    /// [`ClientError::Pipeline`] if the sketch cannot be normalized
    /// (an empty sketch gives [`PipelineError::EmptyShape`]).
    pub fn begin_submission(&self) -> Result<Option<PendingSubmission>, ClientError> {
        let Some(token) = self.submission.try_acquire() else {
            debug!("submission already in flight; ignoring");
            return Ok(None);
        };
        let (Some(location), Some(bounds)) = (self.location.clone(), self.bounds) else {
            return Err(ClientError::NoLocation);
        };

        let strokes = self.recorder.snapshot();
        let prepared = mapsketch_pipeline::prepare(&strokes, &self.config)?;
        let shape = prepared.normalized.shape;
        info!(
            "submitting {}x{} shape ({} points) to {location}",
            shape.cols(),
            shape.rows(),
            strokes.len()
        );

        Ok(Some(PendingSubmission {
            token,
            generation: self.generation,
            location,
            request: MatchRequest { shape, bounds },
            strokes,
            traced: prepared.traced,
        }))
    }

    /// Store a matcher response and draw the best candidate.
    ///
    /// Returns the drawn path, or `Ok(None)` if the session was reset
    /// while the request was outstanding.
    ///
    /// # Errors
    ///
    /// [`ClientError::NoResults`] if the matcher found nothing; the
    /// empty results are still stored.
    pub fn complete_submission(
        &mut self,
        done: CompletedSubmission,
    ) -> Result<Option<&LineString<f64>>, ClientError> {
        if done.generation != self.generation {
            debug!("discarding match response from before reset");
            return Ok(None);
        }
        let results = MatchResults {
            best: done.response.best,
            scale: done.response.scale,
            strokes: done.strokes,
            traced: done.traced,
        };
        let empty = results.is_empty();
        info!("matcher returned {} candidates", results.len());
        self.results = Some(results);
        if empty {
            return Err(ClientError::NoResults);
        }
        self.select_result(0)
    }

    /// Begin, send and complete a submission.
    ///
    /// Returns `Ok(None)` if another submission is outstanding.
    ///
    /// # Errors
    ///
    /// Any error from the three steps.
    pub async fn submit<S>(&mut self, service: &S) -> Result<Option<&LineString<f64>>, ClientError>
    where
        S: MatchService + ?Sized,
    {
        let Some(pending) = self.begin_submission()? else {
            return Ok(None);
        };
        let done = pending.send(service).await?;
        self.complete_submission(done)
    }

    /// Draw the path for candidate `index` of the current results.
    ///
    /// Out-of-range indices, or having no results, draw nothing.
    ///
    /// # Errors
    ///
    /// [`ClientError::Pipeline`] if the stored snapshot cannot be
    /// remapped.
    pub fn select_result(&mut self, index: usize) -> Result<Option<&LineString<f64>>, ClientError> {
        let Some(results) = &self.results else {
            debug!("no results to select from");
            return Ok(None);
        };
        let Some(path) = results.path_for(index)? else {
            debug!("result {index} out of range ({} candidates)", results.len());
            return Ok(None);
        };
        self.paths.push(path);
        Ok(self.paths.last())
    }

    /// Prepare a snap of the most recent path.
    ///
    /// Returns `None` if there is no path or a snap is outstanding.
    #[must_use]
    pub fn begin_snap(&self) -> Option<PendingSnap> {
        let Some(path) = self.paths.last() else {
            debug!("no path to snap");
            return None;
        };
        let Some(token) = self.snap.try_acquire() else {
            debug!("snap already in flight; ignoring");
            return None;
        };
        let samples = snap_sample(path, self.config.snap_point_limit);
        debug!("snapping {} of {} points", samples.len(), path.0.len());
        Some(PendingSnap {
            token,
            generation: self.generation,
            original: path.clone(),
            samples,
        })
    }

    /// Replace the snapped path with the snapper's result.
    ///
    /// If the original path has since been cleared the snapped path is
    /// drawn as a new path. An empty snap result keeps the original.
    pub fn complete_snap(&mut self, done: CompletedSnap) -> Option<&LineString<f64>> {
        if done.generation != self.generation {
            debug!("discarding snap from before reset");
            return None;
        }
        if done.snapped.is_empty() {
            warn!("road snapper returned no points; keeping drawn path");
            return None;
        }
        let snapped: LineString<f64> = done.snapped.into_iter().collect();
        if let Some(pos) = self.paths.iter().rposition(|p| *p == done.original) {
            self.paths[pos] = snapped;
            return self.paths.get(pos);
        }
        self.paths.push(snapped);
        self.paths.last()
    }

    /// Begin, send and complete a snap.
    ///
    /// Returns `Ok(None)` if nothing was snapped.
    ///
    /// # Errors
    ///
    /// Propagates the snapper error.
    pub async fn snap_last_path<R>(
        &mut self,
        snapper: &R,
    ) -> Result<Option<&LineString<f64>>, ClientError>
    where
        R: RoadSnapper + ?Sized,
    {
        let Some(pending) = self.begin_snap() else {
            return Ok(None);
        };
        let done = pending.send(snapper).await?;
        Ok(self.complete_snap(done))
    }
}
