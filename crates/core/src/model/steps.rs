use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum StepError {
    #[error("recipe has no steps to walk through")]
    NoSteps,

    #[error("page width must be a positive number, got {0}")]
    InvalidPageWidth(f64),
}

//
// ─── STEP PROGRESS ─────────────────────────────────────────────────────────────
//

/// Position inside a horizontally paged list of instruction steps.
///
/// The current step is always derived from the scroll offset:
/// `clamp(round(offset / page_width), 0, total - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepProgress {
    total: usize,
    page_width: f64,
    current: usize,
    offset: f64,
}

impl StepProgress {
    /// # Errors
    ///
    /// Returns `StepError::NoSteps` when `total == 0` and
    /// `StepError::InvalidPageWidth` for a non-positive or non-finite width.
    pub fn new(total: usize, page_width: f64) -> Result<Self, StepError> {
        if total == 0 {
            return Err(StepError::NoSteps);
        }
        if !page_width.is_finite() || page_width <= 0.0 {
            return Err(StepError::InvalidPageWidth(page_width));
        }
        Ok(Self {
            total,
            page_width,
            current: 0,
            offset: 0.0,
        })
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.current + 1 == self.total
    }

    /// Fraction of the walkthrough reached, `(current + 1) / total`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        (self.current + 1) as f64 / self.total as f64
    }

    /// Offset at which `step` is fully in view.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn offset_for_step(&self, step: usize) -> f64 {
        step.min(self.total - 1) as f64 * self.page_width
    }

    /// Step index shown at `offset`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn step_at(&self, offset: f64) -> usize {
        let offset = sanitize_offset(offset);
        let page = (offset / self.page_width).round();
        let last = (self.total - 1) as f64;
        page.clamp(0.0, last) as usize
    }

    /// Records a scroll position update. Fires continuously while swiping.
    ///
    /// Returns `true` if the current step changed.
    pub fn advance_to(&mut self, offset: f64) -> bool {
        let offset = sanitize_offset(offset);
        let step = self.step_at(offset);
        self.offset = offset;
        let changed = step != self.current;
        self.current = step;
        changed
    }

    /// Back to the first step, scrolled to the start.
    pub fn reset(&mut self) {
        self.current = 0;
        self.offset = 0.0;
    }
}

fn sanitize_offset(offset: f64) -> f64 {
    if offset.is_finite() && offset > 0.0 {
        offset
    } else {
        0.0
    }
}

//
// ─── PROGRESS TWEEN ────────────────────────────────────────────────────────────
//

/// Linear animation of the progress bar toward its latest target.
///
/// Purely presentational; reading it never affects step transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTween {
    from: f64,
    to: f64,
    started_at: DateTime<Utc>,
    duration: Duration,
}

impl ProgressTween {
    /// Default animation length for a step change.
    pub const DEFAULT_DURATION_MS: i64 = 300;

    #[must_use]
    pub fn new(initial: f64, duration: Duration, now: DateTime<Utc>) -> Self {
        let initial = initial.clamp(0.0, 1.0);
        Self {
            from: initial,
            to: initial,
            started_at: now,
            duration,
        }
    }

    /// Starts animating from the currently displayed value toward `target`.
    pub fn retarget(&mut self, target: f64, now: DateTime<Utc>) {
        self.from = self.value_at(now);
        self.to = target.clamp(0.0, 1.0);
        self.started_at = now;
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.to
    }

    /// Displayed bar fill at `now`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value_at(&self, now: DateTime<Utc>) -> f64 {
        let total = self.duration.num_milliseconds();
        if total <= 0 {
            return self.to;
        }
        let elapsed = (now - self.started_at).num_milliseconds().clamp(0, total);
        let t = elapsed as f64 / total as f64;
        self.from + (self.to - self.from) * t
    }

    #[must_use]
    pub fn is_settled(&self, now: DateTime<Utc>) -> bool {
        now - self.started_at >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    const WIDTH: f64 = 300.0;

    #[test]
    fn empty_step_list_is_rejected() {
        assert_eq!(StepProgress::new(0, WIDTH).unwrap_err(), StepError::NoSteps);
    }

    #[test]
    fn invalid_page_width_is_rejected() {
        assert!(matches!(
            StepProgress::new(3, 0.0),
            Err(StepError::InvalidPageWidth(_))
        ));
        assert!(StepProgress::new(3, f64::INFINITY).is_err());
    }

    #[test]
    fn page_three_of_five() {
        let mut progress = StepProgress::new(5, WIDTH).unwrap();
        assert!(progress.advance_to(3.0 * WIDTH));
        assert_eq!(progress.current_step(), 3);
        assert!((progress.progress() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn rounds_to_nearest_page() {
        let mut progress = StepProgress::new(5, WIDTH).unwrap();
        progress.advance_to(1.49 * WIDTH);
        assert_eq!(progress.current_step(), 1);
        progress.advance_to(1.5 * WIDTH);
        assert_eq!(progress.current_step(), 2);
    }

    #[test]
    fn clamps_overscroll_and_negative_offsets() {
        let mut progress = StepProgress::new(3, WIDTH).unwrap();
        progress.advance_to(10.0 * WIDTH);
        assert_eq!(progress.current_step(), 2);
        assert!(progress.is_last_step());

        progress.advance_to(-40.0);
        assert_eq!(progress.current_step(), 0);
        assert_eq!(progress.offset(), 0.0);

        progress.advance_to(f64::NAN);
        assert_eq!(progress.current_step(), 0);
    }

    #[test]
    fn repeated_offsets_within_a_page_do_not_report_change() {
        let mut progress = StepProgress::new(4, WIDTH).unwrap();
        assert!(progress.advance_to(WIDTH));
        assert!(!progress.advance_to(WIDTH + 20.0));
        assert_eq!(progress.offset(), WIDTH + 20.0);
    }

    #[test]
    fn single_step_is_immediately_last() {
        let progress = StepProgress::new(1, WIDTH).unwrap();
        assert!(progress.is_last_step());
        assert!((progress.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reset_returns_to_start() {
        let mut progress = StepProgress::new(5, WIDTH).unwrap();
        progress.advance_to(4.0 * WIDTH);
        progress.reset();
        assert_eq!(progress.current_step(), 0);
        assert_eq!(progress.offset(), 0.0);
        assert_eq!(progress.offset_for_step(9), 4.0 * WIDTH);
    }

    #[test]
    fn tween_interpolates_and_settles() {
        let start = fixed_now();
        let duration = Duration::milliseconds(ProgressTween::DEFAULT_DURATION_MS);
        let mut tween = ProgressTween::new(0.2, duration, start);
        tween.retarget(0.4, start);

        let halfway = tween.value_at(start + Duration::milliseconds(150));
        assert!((halfway - 0.3).abs() < 1e-9);
        assert!(!tween.is_settled(start + Duration::milliseconds(299)));
        assert!(tween.is_settled(start + Duration::milliseconds(300)));
        assert!((tween.value_at(start + Duration::seconds(5)) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn retarget_mid_flight_starts_from_displayed_value() {
        let start = fixed_now();
        let mut tween = ProgressTween::new(0.0, Duration::milliseconds(300), start);
        tween.retarget(1.0, start);
        let mid = start + Duration::milliseconds(150);
        tween.retarget(0.0, mid);
        assert!((tween.value_at(mid) - 0.5).abs() < 1e-9);
        assert_eq!(tween.target(), 0.0);
    }
}
