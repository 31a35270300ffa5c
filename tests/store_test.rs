use recipe_keeper::model::Recipe;
use recipe_keeper::store::{RecipeStore, SortOrder};
use serde_json::json;
use std::time::Duration;

fn recipe(title: &str) -> Recipe {
    Recipe {
        title: Some(title.to_string()),
        ingredients: vec!["salt".to_string()],
        instructions: vec!["season".to_string()],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_insert_then_list_orders_by_recency() {
    let store = RecipeStore::connect_memory().await.unwrap();

    store.insert(&recipe("First")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.insert(&recipe("Second")).await.unwrap();

    let newest = store.list_all(SortOrder::Newest).await.unwrap();
    assert_eq!(newest.len(), 2);
    assert_eq!(newest[0].title.as_deref(), Some("Second"));
    assert_eq!(newest[1].title.as_deref(), Some("First"));

    let oldest = store.list_all(SortOrder::Oldest).await.unwrap();
    assert_eq!(oldest[0].title.as_deref(), Some("First"));
    assert_eq!(oldest[1].title.as_deref(), Some("Second"));
}

#[tokio::test]
async fn test_list_by_title() {
    let store = RecipeStore::connect_memory().await.unwrap();

    store.insert(&recipe("Zucchini bake")).await.unwrap();
    store.insert(&recipe("Apple pie")).await.unwrap();
    store.insert(&recipe("Minestrone")).await.unwrap();

    let by_title = store.list_all(SortOrder::Title).await.unwrap();
    let titles: Vec<_> = by_title.iter().filter_map(|r| r.title.as_deref()).collect();
    assert_eq!(titles, vec!["Apple pie", "Minestrone", "Zucchini bake"]);
}

#[tokio::test]
async fn test_insert_stamps_added_on() {
    let store = RecipeStore::connect_memory().await.unwrap();

    let preview = recipe("Stamped");
    assert!(preview.added_on.is_none());
    store.insert(&preview).await.unwrap();

    let stored = store.list_all(SortOrder::Newest).await.unwrap();
    assert!(stored[0].added_on.is_some());
    assert!(stored[0].id.is_some());
}

#[tokio::test]
async fn test_delete_is_idempotent_in_effect() {
    let store = RecipeStore::connect_memory().await.unwrap();

    let id = store.insert(&recipe("Doomed")).await.unwrap();
    let key = id.key().to_string();

    assert!(store.delete(&key).await.unwrap());
    // Second call on the same id: false, and the record stays gone.
    assert!(!store.delete(&key).await.unwrap());
    assert!(store.list_all(SortOrder::Newest).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_id_is_not_an_error() {
    let store = RecipeStore::connect_memory().await.unwrap();
    assert!(!store.delete("never-existed").await.unwrap());
}

#[tokio::test]
async fn test_wrong_typed_lists_are_stored_as_empty_lists() {
    let store = RecipeStore::connect_memory().await.unwrap();

    // Model output with a string where a list belongs, and one list
    // missing entirely.
    let malformed = Recipe::from_model_json(json!({
        "title": "Sloppy",
        "ingredients": "flour, water",
        "keywords": null
    }))
    .unwrap();
    store.insert(&malformed).await.unwrap();

    let stored = &store.list_all(SortOrder::Newest).await.unwrap()[0];
    assert_eq!(stored.ingredients, Vec::<String>::new());
    assert_eq!(stored.instructions, Vec::<String>::new());
    assert_eq!(stored.keywords, Vec::<String>::new());
}

#[tokio::test]
async fn test_text_search_returns_the_matching_record_first() {
    let store = RecipeStore::connect_memory().await.unwrap();

    let cake = Recipe {
        title: Some("Chocolate cake".to_string()),
        ingredients: vec!["cocoa".to_string(), "flour".to_string()],
        instructions: vec!["mix well".to_string()],
        ..Default::default()
    };
    let soup = Recipe {
        title: Some("Lentil soup".to_string()),
        ingredients: vec!["lentils".to_string(), "water".to_string()],
        instructions: vec!["boil gently".to_string()],
        ..Default::default()
    };
    store.insert(&cake).await.unwrap();
    store.insert(&soup).await.unwrap();

    let results = store.search("chocolate cake").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title.as_deref(), Some("Chocolate cake"));
}

#[tokio::test]
async fn test_search_covers_keywords_and_description() {
    let store = RecipeStore::connect_memory().await.unwrap();

    let tagged = Recipe {
        title: Some("Friday dish".to_string()),
        description: Some("A slow-cooked stew".to_string()),
        keywords: vec!["cholent".to_string()],
        ..Default::default()
    };
    store.insert(&tagged).await.unwrap();

    assert_eq!(store.search("cholent").await.unwrap().len(), 1);
    assert_eq!(store.search("stew").await.unwrap().len(), 1);
    assert!(store.search("sushi").await.unwrap().is_empty());
}
