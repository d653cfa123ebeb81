use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use cook_core::model::{CookingUpdate, RecipeDraft, RecipeId, User, UserId};
use cook_core::time::fixed_now;
use storage::repository::{
    InMemoryRepository, ProfileUpdate, RecipeRepository, Storage, StorageError, UserRepository,
};
use services::{AppServices, Clock, Completion, CookingError, CookingTracker, WalkerSettings};

fn recipe_id(raw: &str) -> RecipeId {
    RecipeId::new(raw).unwrap()
}

async fn seed_recipe(repo: &InMemoryRepository, id: &str, steps: usize) {
    let recipe = RecipeDraft {
        id: recipe_id(id),
        name: format!("Recipe {id}"),
        category: "Soups".to_string().into(),
        duration: "30 min".into(),
        description: String::new(),
        image: None,
        image_detail: None,
        materials: vec!["water".into()],
        steps: (1..=steps).map(|i| format!("Step {i}")).collect(),
    }
    .validate()
    .unwrap();
    repo.upsert_recipe(&recipe).await.unwrap();
}

fn app(repo: &InMemoryRepository) -> AppServices {
    AppServices::from_storage(
        &Storage::from_in_memory(repo.clone()),
        Clock::fixed(fixed_now()),
        WalkerSettings::default(),
    )
}

#[tokio::test]
async fn sign_up_then_start_and_finish_a_recipe() {
    let repo = InMemoryRepository::new();
    let app = app(&repo);

    let me = app
        .auth()
        .sign_up("sari@example.com", "Sari", "secret1")
        .await
        .unwrap();
    let user = repo.get_user(&me.id).await.unwrap().unwrap();
    assert!(user.cooking().is_empty());

    let tracker = app.tracker();
    let abc = recipe_id("abc123");
    assert!(tracker.start(&me.id, &abc).await.unwrap());
    assert!(tracker.query_status(&me.id, &abc).await.unwrap());
    assert!(!tracker.finish(&me.id, &abc).await.unwrap());
    assert!(!tracker.query_status(&me.id, &abc).await.unwrap());
}

#[tokio::test]
async fn walker_completion_finishes_the_recipe_for_the_session_user() {
    let repo = InMemoryRepository::new();
    seed_recipe(&repo, "abc123", 5).await;
    let app = app(&repo);
    let me = app
        .auth()
        .sign_up("sari@example.com", "Sari", "secret1")
        .await
        .unwrap();

    let abc = recipe_id("abc123");
    let mut status = app.tracker().watch(&me.id, &abc);
    app.tracker().start(&me.id, &abc).await.unwrap();
    assert_eq!(status.next().await, Some(true));

    let mut walker = app.open_walker(&abc).await.unwrap();
    walker.show();
    let width = app.settings().page_width;
    walker.advance_to(2.0 * width);
    assert_eq!(
        walker.complete().await.unwrap(),
        Completion::NotAtLastStep { step: 2 }
    );
    assert!(app.tracker().query_status(&me.id, &abc).await.unwrap());

    assert_eq!(walker.show(), 2.0 * width);
    walker.advance_to(4.0 * width);
    assert_eq!(
        walker.complete().await.unwrap(),
        Completion::Finished { cooking: false }
    );
    assert_eq!(walker.current_step(), 0);
    assert_eq!(status.current(), Some(false));
}

#[tokio::test]
async fn open_walker_requires_session_and_steps() {
    let repo = InMemoryRepository::new();
    seed_recipe(&repo, "empty", 0).await;
    let app = app(&repo);

    assert!(matches!(
        app.open_walker(&recipe_id("empty")).await,
        Err(CookingError::Unauthenticated)
    ));

    app.auth()
        .sign_up("sari@example.com", "Sari", "secret1")
        .await
        .unwrap();
    assert!(matches!(
        app.open_walker(&recipe_id("empty")).await,
        Err(CookingError::InvalidInput(_))
    ));
    assert!(matches!(
        app.open_walker(&recipe_id("missing")).await,
        Err(CookingError::RecipeNotFound(_))
    ));
}

/// Holds every cooking write until released.
#[derive(Clone)]
struct GatedUsers {
    inner: InMemoryRepository,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl UserRepository for GatedUsers {
    async fn create_user(&self, user: &User) -> Result<(), StorageError> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        self.inner.get_user(id).await
    }

    async fn update_cooking(
        &self,
        id: &UserId,
        update: &CookingUpdate,
    ) -> Result<(), StorageError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.update_cooking(id, update).await
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, StorageError> {
        self.inner.update_profile(id, update).await
    }
}

#[tokio::test]
async fn same_pair_is_busy_while_an_update_is_in_flight() {
    let inner = InMemoryRepository::new();
    let user = UserId::new("u1").unwrap();
    inner
        .create_user(&User::new(user.clone(), "Sari", "sari@example.com", fixed_now()).unwrap())
        .await
        .unwrap();
    let gated = GatedUsers {
        inner: inner.clone(),
        entered: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
    };
    let tracker = CookingTracker::new(Arc::new(gated.clone()));
    let abc = recipe_id("abc123");

    let first = tokio::spawn({
        let tracker = tracker.clone();
        let user = user.clone();
        let abc = abc.clone();
        async move { tracker.start(&user, &abc).await }
    });
    gated.entered.notified().await;

    assert!(matches!(
        tracker.finish(&user, &abc).await,
        Err(CookingError::Busy { .. })
    ));
    assert!(matches!(
        tracker.start(&user, &abc).await,
        Err(CookingError::Busy { .. })
    ));

    gated.release.notify_one();
    assert!(first.await.unwrap().unwrap());
    assert_eq!(inner.cooking_writes(), 1);

    gated.release.notify_one();
    assert!(!tracker.finish(&user, &abc).await.unwrap());
}
