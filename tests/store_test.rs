//! Store contract properties, exercised through the file backend.

use std::sync::Arc;

use faqbot::models::FaqInput;
use faqbot::store::FaqStore;

fn temp_store(dir: &tempfile::TempDir) -> FaqStore {
    FaqStore::file(dir.path().join("faq.json"))
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    // same (question, answer, category) twice yields one record with a
    // stable id and a bumped updated_at.
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    let first = store
        .upsert(FaqInput::new("What is your name?", "ChatBot"))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = store
        .upsert(FaqInput::new("What is your name?", "ChatBot"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(store.get_all().await.len(), 1);
}

#[tokio::test]
async fn test_question_uniqueness_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    store.upsert(FaqInput::new("Hello?", "a")).await.unwrap();
    store.upsert(FaqInput::new("hello?", "b")).await.unwrap();

    let all = store.get_all().await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].answer, "b");
}

#[tokio::test]
async fn test_validation_error_is_distinct_from_backend_failure() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    let err = store.upsert(FaqInput::new("  ", "answer")).await.unwrap_err();
    assert!(err.is_validation());
    assert!(store.get_all().await.is_empty());
}

#[tokio::test]
async fn test_bulk_upsert_skips_invalid_items() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    let count = store
        .bulk_upsert(vec![
            FaqInput::new("Q1?", "A1"),
            FaqInput::new("", "no question"),
            FaqInput::new("Q2?", "A2"),
        ])
        .await;

    assert_eq!(count, 2);
    assert_eq!(store.get_all().await.len(), 2);
}

#[tokio::test]
async fn test_delete_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    let record = store.upsert(FaqInput::new("Q?", "A")).await.unwrap();
    assert!(store.delete(&record.id).await.unwrap());
    assert!(!store.delete(&record.id).await.unwrap());
    assert!(store.get_all().await.is_empty());
}

#[tokio::test]
async fn test_categories_are_listed_sorted_and_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    for (q, cat) in [("Q1?", "billing"), ("Q2?", "general"), ("Q3?", "billing")] {
        let mut input = FaqInput::new(q, "A");
        input.category = Some(cat.to_string());
        store.upsert(input).await.unwrap();
    }

    assert_eq!(store.list_categories().await, vec!["billing", "general"]);
    assert_eq!(store.get_by_category("Billing").await.len(), 2);
}

#[tokio::test]
async fn test_store_is_shareable_across_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(temp_store(&dir));

    let mut handles = Vec::new();
    for i in 0..4 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .upsert(FaqInput::new(format!("Question {i}?"), "answer"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.get_all().await.len(), 4);
}
