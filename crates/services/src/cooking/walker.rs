use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use cook_core::model::{ProgressTween, Recipe, RecipeId, StepError, StepProgress, UserId};

use super::tracker::CookingTracker;
use crate::Clock;
use crate::error::CookingError;

/// Layout and animation parameters for the step sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkerSettings {
    /// Width of one step page; scroll offsets are measured in the same unit.
    pub page_width: f64,
    /// How long the progress bar takes to reach a new value.
    pub animation: Duration,
}

impl WalkerSettings {
    pub const DEFAULT_PAGE_WIDTH: f64 = 327.0;
}

impl Default for WalkerSettings {
    fn default() -> Self {
        Self {
            page_width: Self::DEFAULT_PAGE_WIDTH,
            animation: Duration::milliseconds(ProgressTween::DEFAULT_DURATION_MS),
        }
    }
}

/// Result of pressing the done action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The recipe was finished; `cooking` is the re-read status.
    Finished { cooking: bool },
    /// Not on the last step yet, so nothing was recorded.
    NotAtLastStep { step: usize },
}

/// Render state of the walker.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkerView {
    pub visible: bool,
    pub step: usize,
    pub total: usize,
    pub text: String,
    pub offset: f64,
    pub is_last_step: bool,
    /// Where the progress bar is heading.
    pub progress: f64,
    /// Where the progress bar is drawn right now.
    pub displayed_progress: f64,
}

/// Step-by-step cooking instructions for one recipe.
///
/// Position survives `hide`/`show`; only a successful completion resets it.
pub struct StepWalker {
    tracker: CookingTracker,
    clock: Clock,
    user: UserId,
    recipe: RecipeId,
    steps: Vec<String>,
    progress: StepProgress,
    tween: ProgressTween,
    animation: Duration,
    visible: bool,
}

impl StepWalker {
    /// # Errors
    ///
    /// Returns `CookingError::InvalidInput` if the recipe has no steps or the
    /// page width is not a positive finite number.
    pub fn new(
        tracker: CookingTracker,
        clock: Clock,
        user: UserId,
        recipe: &Recipe,
        settings: WalkerSettings,
    ) -> Result<Self, CookingError> {
        let progress = StepProgress::new(recipe.steps().len(), settings.page_width)
            .map_err(|err| invalid_input(recipe.id(), &err))?;
        let tween = ProgressTween::new(progress.progress(), settings.animation, clock.now());

        Ok(Self {
            tracker,
            clock,
            user,
            recipe: recipe.id().clone(),
            steps: recipe.steps().to_vec(),
            progress,
            tween,
            animation: settings.animation,
            visible: false,
        })
    }

    /// Opens the sheet and returns the scroll offset to restore.
    pub fn show(&mut self) -> f64 {
        self.visible = true;
        self.progress.offset()
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Feeds a scroll offset. Returns `true` if the current step changed.
    pub fn advance_to(&mut self, offset: f64) -> bool {
        let changed = self.progress.advance_to(offset);
        if changed {
            self.tween
                .retarget(self.progress.progress(), self.clock.now());
            debug!(
                recipe = %self.recipe,
                step = self.progress.current_step(),
                "step changed"
            );
        }
        changed
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.progress.current_step()
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress.progress()
    }

    #[must_use]
    pub fn current_text(&self) -> &str {
        self.steps
            .get(self.progress.current_step())
            .map_or("", String::as_str)
    }

    /// Progress bar fill at `now`, following the tween.
    #[must_use]
    pub fn displayed_progress_at(&self, now: DateTime<Utc>) -> f64 {
        self.tween.value_at(now)
    }

    #[must_use]
    pub fn view(&self) -> WalkerView {
        WalkerView {
            visible: self.visible,
            step: self.progress.current_step(),
            total: self.progress.total(),
            text: self.current_text().to_owned(),
            offset: self.progress.offset(),
            is_last_step: self.progress.is_last_step(),
            progress: self.progress.progress(),
            displayed_progress: self.displayed_progress_at(self.clock.now()),
        }
    }

    /// The done action: finishes the recipe when on the last step.
    ///
    /// The sheet is closed in every case. Off the last step nothing is
    /// written and the position is kept. On a failed finish the position is
    /// kept too, so the user can retry.
    ///
    /// # Errors
    ///
    /// Any error from [`CookingTracker::finish`].
    pub async fn complete(&mut self) -> Result<Completion, CookingError> {
        self.visible = false;

        if !self.progress.is_last_step() {
            return Ok(Completion::NotAtLastStep {
                step: self.progress.current_step(),
            });
        }

        let cooking = self.tracker.finish(&self.user, &self.recipe).await?;
        self.progress.reset();
        self.tween = ProgressTween::new(
            self.progress.progress(),
            self.animation,
            self.clock.now(),
        );
        info!(user = %self.user, recipe = %self.recipe, "completed all steps");
        Ok(Completion::Finished { cooking })
    }
}

fn invalid_input(recipe: &RecipeId, err: &StepError) -> CookingError {
    CookingError::InvalidInput(format!("recipe {recipe}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cook_core::model::{RecipeDraft, User};
    use cook_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, UserRepository};

    const WIDTH: f64 = 327.0;

    fn recipe(steps: usize) -> Recipe {
        RecipeDraft {
            id: RecipeId::new("abc123").unwrap(),
            name: "Nasi Goreng".into(),
            category: "Main".to_string().into(),
            duration: "20 min".into(),
            description: String::new(),
            image: None,
            image_detail: None,
            materials: vec![],
            steps: (1..=steps).map(|i| format!("Step {i}")).collect(),
        }
        .validate()
        .unwrap()
    }

    async fn walker(steps: usize) -> (StepWalker, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1").unwrap();
        repo.create_user(&User::new(user.clone(), "Sari", "sari@example.com", fixed_now()).unwrap())
            .await
            .unwrap();
        let tracker = CookingTracker::new(Arc::new(repo.clone()));
        let walker = StepWalker::new(
            tracker,
            Clock::fixed(fixed_now()),
            user,
            &recipe(steps),
            WalkerSettings::default(),
        )
        .unwrap();
        (walker, repo)
    }

    #[tokio::test]
    async fn empty_recipe_is_invalid_input() {
        let repo = InMemoryRepository::new();
        let err = StepWalker::new(
            CookingTracker::new(Arc::new(repo)),
            Clock::fixed(fixed_now()),
            UserId::new("u1").unwrap(),
            &recipe(0),
            WalkerSettings::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, CookingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn zero_page_width_is_invalid_input() {
        let err = StepWalker::new(
            CookingTracker::new(Arc::new(InMemoryRepository::new())),
            Clock::fixed(fixed_now()),
            UserId::new("u1").unwrap(),
            &recipe(3),
            WalkerSettings {
                page_width: 0.0,
                ..WalkerSettings::default()
            },
        )
        .err()
        .unwrap();
        assert!(matches!(err, CookingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn offset_of_page_three_selects_step_three() {
        let (mut w, _) = walker(5).await;
        assert!(w.advance_to(3.0 * WIDTH));
        assert_eq!(w.current_step(), 3);
        assert!((w.progress() - 0.8).abs() < f64::EPSILON);
        assert_eq!(w.current_text(), "Step 4");
    }

    #[tokio::test]
    async fn hide_and_show_keep_position() {
        let (mut w, _) = walker(5).await;
        w.show();
        w.advance_to(2.0 * WIDTH + 10.0);
        w.hide();
        assert!(!w.is_visible());

        let restored = w.show();
        assert!((restored - (2.0 * WIDTH + 10.0)).abs() < f64::EPSILON);
        assert_eq!(w.current_step(), 2);
    }

    #[tokio::test]
    async fn complete_before_last_step_does_nothing() {
        let (mut w, repo) = walker(5).await;
        w.show();
        w.advance_to(2.0 * WIDTH);

        let outcome = w.complete().await.unwrap();
        assert_eq!(outcome, Completion::NotAtLastStep { step: 2 });
        assert_eq!(w.current_step(), 2);
        assert!(!w.is_visible());
        assert_eq!(repo.cooking_writes(), 0);
    }

    #[tokio::test]
    async fn complete_on_last_step_finishes_once_and_resets() {
        let (mut w, repo) = walker(5).await;
        w.show();
        w.advance_to(4.0 * WIDTH);

        let outcome = w.complete().await.unwrap();
        assert_eq!(outcome, Completion::Finished { cooking: false });
        assert_eq!(repo.cooking_writes(), 1);
        assert_eq!(w.current_step(), 0);
        assert!(w.view().offset.abs() < f64::EPSILON);
        assert!(!w.is_visible());
    }

    #[tokio::test]
    async fn failed_finish_keeps_position() {
        let (mut w, repo) = walker(3).await;
        w.advance_to(2.0 * WIDTH);
        repo.set_offline(true);

        let err = w.complete().await.unwrap_err();
        assert!(matches!(err, CookingError::StoreUnavailable(_)));
        assert_eq!(w.current_step(), 2);
        assert!(!w.is_visible());
    }

    #[tokio::test]
    async fn single_step_recipe_is_immediately_last() {
        let (mut w, _) = walker(1).await;
        assert!(w.view().is_last_step);
        assert!((w.progress() - 1.0).abs() < f64::EPSILON);
        assert!(matches!(
            w.complete().await.unwrap(),
            Completion::Finished { .. }
        ));
    }

    #[tokio::test]
    async fn progress_bar_animates_toward_new_step() {
        let (mut w, _) = walker(4).await;
        let start = fixed_now();
        assert!((w.displayed_progress_at(start) - 0.25).abs() < 1e-9);

        w.advance_to(3.0 * WIDTH);
        let halfway = start + Duration::milliseconds(150);
        assert!((w.displayed_progress_at(halfway) - 0.625).abs() < 1e-9);
        let done = start + Duration::milliseconds(300);
        assert!((w.displayed_progress_at(done) - 1.0).abs() < 1e-9);
        assert!((w.view().progress - 1.0).abs() < f64::EPSILON);
    }
}
