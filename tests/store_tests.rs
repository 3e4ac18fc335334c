use recipebox::config::SecurityConfig;
use recipebox::db::{CatalogError, CreateUserError, Store};
use recipebox::models::account::ProfileFields;
use recipebox::models::recipe::{NewRecipe, NewReview};
use recipebox::services::{AccountError, AccountService, SeaOrmAccountService};

fn fast_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 64,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        ..SecurityConfig::default()
    }
}

async fn memory_store() -> Store {
    Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory store")
}

async fn sample_user(store: &Store) -> i32 {
    store
        .create_user(
            &fast_security(),
            "test@example.com",
            "pass123",
            &ProfileFields::default(),
        )
        .await
        .unwrap()
        .id
}

fn recipe(title: &str) -> NewRecipe {
    NewRecipe {
        title: title.to_string(),
        description: None,
        time_minutes: 5,
        price_cents: 550,
        link: None,
        tag_ids: vec![],
        ingredient_ids: vec![],
    }
}

#[tokio::test]
async fn test_create_user_with_email_successful() {
    let store = memory_store().await;
    let security = fast_security();

    let account = store
        .create_user(&security, "test@example.com", "testpass123", &ProfileFields::default())
        .await
        .unwrap();

    assert_eq!(account.email, "test@example.com");
    assert!(account.is_active);
    assert!(!account.is_staff);
    assert!(!account.is_superuser);

    let row = store.get_user_row(account.id).await.unwrap().unwrap();
    assert_ne!(row.password_hash, "testpass123");
    assert!(row.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_new_user_email_normalized() {
    let store = memory_store().await;
    let security = fast_security();

    let cases = [
        ("test1@EXAMPLE.com", "test1@example.com"),
        ("Test2@Example.com", "Test2@example.com"),
        ("TEST3@EXAMPLE.COM", "TEST3@example.com"),
        ("test4@example.COM", "test4@example.com"),
    ];

    for (input, expected) in cases {
        let account = store
            .create_user(&security, input, "sample123", &ProfileFields::default())
            .await
            .unwrap();
        assert_eq!(account.email, expected);
    }
}

#[tokio::test]
async fn test_new_user_without_email_or_password_fails() {
    let store = memory_store().await;
    let security = fast_security();

    let result = store
        .create_user(&security, "", "test123", &ProfileFields::default())
        .await;
    assert!(matches!(result, Err(CreateUserError::MissingEmail)));

    let result = store
        .create_user(&security, "test@example.com", "", &ProfileFields::default())
        .await;
    assert!(matches!(result, Err(CreateUserError::MissingPassword)));
}

#[tokio::test]
async fn test_duplicate_email_rejected_by_store() {
    let store = memory_store().await;
    let security = fast_security();

    store
        .create_user(&security, "dup@example.com", "pass123", &ProfileFields::default())
        .await
        .unwrap();

    let result = store
        .create_user(&security, "dup@EXAMPLE.com", "pass123", &ProfileFields::default())
        .await;
    assert!(matches!(result, Err(CreateUserError::DuplicateEmail)));
}

#[tokio::test]
async fn test_concurrent_registration_same_email() {
    let store = memory_store().await;
    let service = SeaOrmAccountService::new(store.clone(), fast_security());
    let profile = ProfileFields::default();

    let (first, second) = tokio::join!(
        service.register("race@example.com", "Str0ngPw!", &profile),
        service.register("race@example.com", "Str0ngPw!", &profile),
    );

    let (created, rejected) = match (first, second) {
        (Ok(account), Err(e)) | (Err(e), Ok(account)) => (account, e),
        (a, b) => panic!("expected exactly one success, got {a:?} and {b:?}"),
    };

    assert_eq!(created.email, "race@example.com");
    match rejected {
        AccountError::Validation(errors) => assert!(errors.get("email").is_some()),
        other => panic!("expected an email validation error, got {other:?}"),
    }

    let stored = store.get_user(created.id).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_create_superuser() {
    let store = memory_store().await;

    let account = store
        .create_superuser(
            &fast_security(),
            "admin@example.com",
            "test123",
            &ProfileFields::default(),
        )
        .await
        .unwrap();

    assert!(account.is_superuser);
    assert!(account.is_staff);
}

#[tokio::test]
async fn test_tokens_resolve_to_their_user() {
    let store = memory_store().await;
    let user_id = sample_user(&store).await;

    assert!(store.get_user_token(user_id).await.unwrap().is_none());

    let token = store.get_or_create_token(user_id).await.unwrap();
    assert_eq!(store.get_or_create_token(user_id).await.unwrap(), token);

    let owner = store.find_user_by_token(&token).await.unwrap().unwrap();
    assert_eq!(owner.id, user_id);

    assert!(store.find_user_by_token("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn test_set_user_active() {
    let store = memory_store().await;
    let user_id = sample_user(&store).await;

    assert!(store.set_user_active("test@example.com", false).await.unwrap());
    let account = store.get_user(user_id).await.unwrap().unwrap();
    assert!(!account.is_active);

    assert!(!store.set_user_active("missing@example.com", false).await.unwrap());
}

#[tokio::test]
async fn test_create_tag_display() {
    let store = memory_store().await;
    let user_id = sample_user(&store).await;

    let tag = store.create_tag(user_id, "Vegan").await.unwrap();

    assert_eq!(tag.to_string(), tag.name);
    assert_eq!(tag.user_id, user_id);
}

#[tokio::test]
async fn test_create_ingredient_display() {
    let store = memory_store().await;

    let ingredient = store.create_ingredient("Cucumber").await.unwrap();
    assert_eq!(ingredient.to_string(), "Cucumber");

    // Names are unique, so the existing row comes back
    let again = store.create_ingredient("Cucumber").await.unwrap();
    assert_eq!(again.id, ingredient.id);

    assert!(matches!(
        store.create_ingredient("   ").await,
        Err(CatalogError::Validation(_))
    ));
}

#[tokio::test]
async fn test_concurrent_create_ingredient_same_name() {
    let store = memory_store().await;

    let (first, second) = tokio::join!(
        store.create_ingredient("Saffron"),
        store.create_ingredient("Saffron"),
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.name, "Saffron");
}

#[tokio::test]
async fn test_ingredient_name_required() {
    let store = memory_store().await;

    assert!(matches!(
        store.create_ingredient("").await,
        Err(CatalogError::Validation(_))
    ));
}

#[tokio::test]
async fn test_create_recipe_with_tags_and_ingredients() {
    let store = memory_store().await;
    let user_id = sample_user(&store).await;

    let vegan = store.create_tag(user_id, "Vegan").await.unwrap();
    let dessert = store.create_tag(user_id, "Dessert").await.unwrap();
    let cocoa = store.create_ingredient("Cocoa").await.unwrap();

    let mut input = recipe("Chocolate mousse");
    input.tag_ids = vec![vegan.id, dessert.id, vegan.id];
    input.ingredient_ids = vec![cocoa.id];

    let created = store.create_recipe(user_id, &input).await.unwrap();
    assert_eq!(created.to_string(), "Chocolate mousse");
    assert_eq!(created.price, "5.50");

    let details = store.get_recipe(created.id).await.unwrap().unwrap();
    let tag_names: Vec<_> = details.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tag_names, vec!["Dessert", "Vegan"]);
    assert_eq!(details.ingredients.len(), 1);
    assert!(details.reviews.is_empty());

    assert!(store.get_recipe(created.id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_recipe_validation() {
    let store = memory_store().await;
    let user_id = sample_user(&store).await;

    let result = store.create_recipe(user_id, &recipe("")).await;
    assert!(matches!(result, Err(CatalogError::Validation(_))));

    let mut input = recipe("Soup");
    input.time_minutes = -1;
    let result = store.create_recipe(user_id, &input).await;
    assert!(matches!(result, Err(CatalogError::Validation(_))));
}

#[tokio::test]
async fn test_create_review_display() {
    let store = memory_store().await;
    let user_id = sample_user(&store).await;
    let created = store.create_recipe(user_id, &recipe("Pancakes")).await.unwrap();

    let review = store
        .create_review(
            user_id,
            &NewReview {
                recipe_id: Some(created.id),
                title: "Great".to_string(),
                body: "Fluffy and quick.".to_string(),
                rating: 5,
            },
        )
        .await
        .unwrap();

    assert_eq!(review.to_string(), "Great");

    let reviews = store.list_reviews_for_recipe(created.id).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].id, review.id);
}

#[tokio::test]
async fn test_create_review_rejects_bad_input() {
    let store = memory_store().await;
    let user_id = sample_user(&store).await;
    let created = store.create_recipe(user_id, &recipe("Toast")).await.unwrap();

    for rating in [0, 6] {
        let result = store
            .create_review(
                user_id,
                &NewReview {
                    recipe_id: Some(created.id),
                    title: "Meh".to_string(),
                    body: String::new(),
                    rating,
                },
            )
            .await;
        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    let result = store
        .create_review(
            user_id,
            &NewReview {
                recipe_id: Some(created.id + 100),
                title: "Lost".to_string(),
                body: String::new(),
                rating: 3,
            },
        )
        .await;
    assert!(matches!(result, Err(CatalogError::NotFound(_))));
}
