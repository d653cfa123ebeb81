use cook_core::model::{
    Category, CookingUpdate, GeoPoint, ImageRef, RecipeDraft, RecipeId, Supermarket,
    SupermarketId, User, UserId,
};
use cook_core::time::fixed_now;
use storage::repository::{
    IdentityProvider, ProfileUpdate, RecipeRepository, StorageError, SupermarketRepository,
    UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn build_user(id: &str) -> User {
    User::new(UserId::new(id).unwrap(), "Sari", "sari@example.com", fixed_now()).unwrap()
}

fn recipe_id(id: &str) -> RecipeId {
    RecipeId::new(id).unwrap()
}

#[tokio::test]
async fn sqlite_cooking_set_add_and_remove_are_idempotent() {
    let repo = connect("memdb_cooking").await;
    let user = build_user("u1");
    repo.create_user(&user).await.unwrap();

    let fetched = repo.get_user(user.id()).await.unwrap().unwrap();
    assert!(fetched.cooking().is_empty());
    assert_eq!(fetched.created_at(), fixed_now());

    let add = CookingUpdate::Add(recipe_id("abc123"));
    repo.update_cooking(user.id(), &add).await.unwrap();
    repo.update_cooking(user.id(), &add).await.unwrap();
    repo.update_cooking(user.id(), &CookingUpdate::Add(recipe_id("def456")))
        .await
        .unwrap();

    let fetched = repo.get_user(user.id()).await.unwrap().unwrap();
    assert_eq!(fetched.cooking().len(), 2);
    assert!(fetched.is_cooking(&recipe_id("abc123")));

    let remove = CookingUpdate::Remove(recipe_id("abc123"));
    repo.update_cooking(user.id(), &remove).await.unwrap();
    repo.update_cooking(user.id(), &remove).await.unwrap();

    let fetched = repo.get_user(user.id()).await.unwrap().unwrap();
    assert!(!fetched.is_cooking(&recipe_id("abc123")));
    assert!(fetched.is_cooking(&recipe_id("def456")));
}

#[tokio::test]
async fn sqlite_missing_user_is_not_found() {
    let repo = connect("memdb_missing").await;
    let ghost = UserId::new("ghost").unwrap();

    assert!(repo.get_user(&ghost).await.unwrap().is_none());
    let err = repo
        .update_cooking(&ghost, &CookingUpdate::Remove(recipe_id("r")))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_duplicate_user_conflicts() {
    let repo = connect("memdb_dup").await;
    repo.create_user(&build_user("u1")).await.unwrap();
    let err = repo.create_user(&build_user("u1")).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_profile_update_persists() {
    let repo = connect("memdb_profile").await;
    let user = build_user("u1");
    repo.create_user(&user).await.unwrap();

    let photo = ImageRef::parse("file:///picker/avatar.jpg").unwrap();
    let updated = repo
        .update_profile(
            user.id(),
            &ProfileUpdate {
                username: Some("Sari W.".into()),
                photo_ref: Some(photo.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.username(), "Sari W.");

    let fetched = repo.get_user(user.id()).await.unwrap().unwrap();
    assert_eq!(fetched.username(), "Sari W.");
    assert_eq!(fetched.photo_ref(), Some(&photo));
}

#[tokio::test]
async fn sqlite_recipes_round_trip_with_ordered_steps() {
    let repo = connect("memdb_recipes").await;
    let recipe = RecipeDraft {
        id: recipe_id("abc123"),
        name: "Soto Ayam".into(),
        category: Category::Soups,
        duration: "45 min".into(),
        description: "Turmeric chicken soup".into(),
        image: Some(ImageRef::parse("https://cdn.example.com/soto.jpg").unwrap()),
        image_detail: None,
        materials: vec!["chicken".into(), "turmeric".into()],
        steps: vec![
            "Boil the chicken".into(),
            "Fry the spice paste".into(),
            "Combine and simmer".into(),
        ],
    }
    .validate()
    .unwrap();

    repo.upsert_recipe(&recipe).await.unwrap();
    repo.upsert_recipe(&recipe).await.unwrap();

    let fetched = repo.get_recipe(recipe.id()).await.unwrap().unwrap();
    assert_eq!(fetched, recipe);
    assert_eq!(fetched.steps()[2], "Combine and simmer");
    assert_eq!(repo.list_recipes().await.unwrap().len(), 1);
    assert!(repo.get_recipe(&recipe_id("nope")).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_supermarkets_round_trip() {
    let repo = connect("memdb_markets").await;
    let market = Supermarket::new(
        SupermarketId::new("s1").unwrap(),
        "Superindo",
        "Jl. Dago No. 1",
        GeoPoint::new(-6.8915, 107.6107).unwrap(),
    )
    .unwrap();
    repo.upsert_supermarket(&market).await.unwrap();

    let listed = repo.list_supermarkets().await.unwrap();
    assert_eq!(listed, vec![market]);
}

#[tokio::test]
async fn sqlite_identity_rejects_duplicate_email_and_bad_password() {
    let repo = connect("memdb_identity").await;
    let account = repo
        .create_account("sari@example.com", "secret1")
        .await
        .unwrap();

    assert!(matches!(
        repo.create_account("sari@example.com", "secret2").await,
        Err(StorageError::Conflict)
    ));
    assert_eq!(
        repo.verify("sari@example.com", "secret1").await.unwrap(),
        Some(account)
    );
    assert!(repo
        .verify("sari@example.com", "secret2")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn sqlite_deleted_account_frees_the_email() {
    let repo = connect("memdb_identity_delete").await;
    let account = repo
        .create_account("sari@example.com", "secret1")
        .await
        .unwrap();

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM credentials")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert!(stored.starts_with("$argon2id$"));

    repo.delete_account(&account).await.unwrap();
    assert!(repo
        .verify("sari@example.com", "secret1")
        .await
        .unwrap()
        .is_none());

    let again = repo
        .create_account("sari@example.com", "secret2")
        .await
        .unwrap();
    assert_ne!(again.user_id, account.user_id);
}
