mod mocks;

use contact_cache::domain::{Matching, Scope};
use contact_cache::error::CacheError;
use contact_cache::models::{Contact, ContactClient, DuplicateRule, RecordRef};
use contact_cache::repositories::MemoryCacheRepository;
use contact_cache::services::MatchService;
use mocks::fixtures::{engine, sent};
use mocks::MockCacheStore;
use std::sync::Arc;

fn email_rule() -> Vec<DuplicateRule> {
    vec![DuplicateRule::new(Matching::EMAIL, Scope::GLOBAL, "P7D")]
}

fn store_with_email_send() -> MockCacheStore {
    let store = MockCacheStore::new();
    let mut record = sent(1, 9, 5, 2);
    record.email = Some("a@b.com".to_string());
    store.add_record(record);
    store
}

#[tokio::test]
async fn test_duplicate_found_for_same_client_only() {
    let store = store_with_email_send();
    let engine = engine(Arc::new(store));
    let contact = Contact::new(6).with_email("a@b.com");

    let found = engine
        .find_duplicate(&contact, &ContactClient::new(9), &email_rule(), None, None, None)
        .await
        .unwrap();
    assert_eq!(
        found,
        Some(RecordRef {
            id: 1,
            contact_id: Some(5)
        })
    );

    let other_client = engine
        .find_duplicate(&contact, &ContactClient::new(10), &email_rule(), None, None, None)
        .await
        .unwrap();
    assert_eq!(other_client, None);
}

#[tokio::test]
async fn test_memory_store_gives_same_answer() {
    let mut record = sent(1, 9, 5, 2);
    record.email = Some("a@b.com".to_string());
    let store = Arc::new(MemoryCacheRepository::with_records(vec![record]));
    let engine = engine(store);
    let contact = Contact::new(6).with_email("  a@b.com ");

    let found = engine
        .find_duplicate(&contact, &ContactClient::new(9), &email_rule(), None, None, None)
        .await
        .unwrap();
    assert_eq!(found.map(|r| r.id), Some(1));
    assert_eq!(engine.metrics().duplicates_found_total(), 1);
}

#[tokio::test]
async fn test_no_active_dimension_skips_query() {
    let store = store_with_email_send();
    let engine = engine(Arc::new(store.clone()));
    let contact = Contact::new(6).with_phone("12");
    let rules = vec![
        DuplicateRule::new(Matching::EMAIL | Matching::PHONE, Scope::GLOBAL, "P7D"),
        DuplicateRule::new(Matching::ADDRESS, Scope::UTM_SOURCE | Scope::CATEGORY, "P7D"),
    ];

    let found = engine
        .find_duplicate(&contact, &ContactClient::new(9), &rules, None, None, None)
        .await
        .unwrap();
    assert_eq!(found, None);
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn test_outside_window_is_not_duplicate() {
    let store = MockCacheStore::new();
    let mut record = sent(1, 9, 5, 10);
    record.email = Some("a@b.com".to_string());
    store.add_record(record);
    let engine = engine(Arc::new(store));

    let found = engine
        .find_duplicate(
            &Contact::new(6).with_email("a@b.com"),
            &ContactClient::new(9),
            &email_rule(),
            None,
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_phone_matches_after_normalization() {
    let store = MockCacheStore::new();
    let mut record = sent(1, 9, 5, 1);
    record.phone = Some("+15551234567".to_string());
    store.add_record(record);
    let engine = engine(Arc::new(store));
    let rules = vec![DuplicateRule::new(Matching::PHONE, Scope::GLOBAL, "P7D")];

    let found = engine
        .find_duplicate(
            &Contact::new(6).with_phone("(555) 123-4567"),
            &ContactClient::new(9),
            &rules,
            None,
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(found.map(|r| r.id), Some(1));
}

#[tokio::test]
async fn test_explicit_matches_contact_id() {
    let store = store_with_email_send();
    let engine = engine(Arc::new(store));
    let rules = vec![DuplicateRule::new(Matching::EXPLICIT, Scope::GLOBAL, "P7D")];

    let found = engine
        .find_duplicate(&Contact::new(5), &ContactClient::new(9), &rules, None, None, None)
        .await
        .unwrap();
    assert_eq!(found.map(|r| r.contact_id), Some(Some(5)));
}

#[tokio::test]
async fn test_address_requires_city_or_zip() {
    let store = MockCacheStore::new();
    let mut record = sent(1, 9, 5, 1);
    record.address1 = Some("1 Main St".to_string());
    store.add_record(record);
    let engine = engine(Arc::new(store.clone()));
    let rules = vec![DuplicateRule::new(Matching::ADDRESS, Scope::GLOBAL, "P7D")];

    let sparse = Contact {
        id: 6,
        address1: Some("1 main st".to_string()),
        ..Default::default()
    };
    let found = engine
        .find_duplicate(&sparse, &ContactClient::new(9), &rules, None, None, None)
        .await
        .unwrap();
    assert_eq!(found, None);
    assert_eq!(store.total_calls(), 0);

    let complete = Contact {
        city: Some("springfield".to_string()),
        ..sparse
    };
    let found = engine
        .find_duplicate(&complete, &ContactClient::new(9), &rules, None, None, None)
        .await
        .unwrap();
    assert_eq!(found.map(|r| r.id), Some(1));
}

#[tokio::test]
async fn test_category_scope_widens_match() {
    let store = MockCacheStore::new();
    let mut record = sent(1, 9, 77, 1);
    record.category_id = Some(4);
    record.email = Some("someone-else@b.com".to_string());
    store.add_record(record);
    let engine = engine(Arc::new(store));
    let rules = vec![DuplicateRule::new(
        Matching::EMAIL,
        Scope::CATEGORY,
        "P7D",
    )];
    let contact = Contact::new(6).with_email("a@b.com");

    let without_category = engine
        .find_duplicate(&contact, &ContactClient::new(9), &rules, None, None, None)
        .await
        .unwrap();
    assert_eq!(without_category, None);

    let with_category = engine
        .find_duplicate(
            &contact,
            &ContactClient::new(9).with_category(4),
            &rules,
            None,
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(with_category.map(|r| r.id), Some(1));
}

#[tokio::test]
async fn test_store_failure_is_not_a_miss() {
    let store = store_with_email_send();
    store.fail_with("replica down");
    let engine = engine(Arc::new(store));

    let result = engine
        .find_duplicate(
            &Contact::new(6).with_email("a@b.com"),
            &ContactClient::new(9),
            &email_rule(),
            None,
            None,
            None,
        )
        .await;
    assert!(matches!(result, Err(CacheError::Store(_))));
}

#[tokio::test]
async fn test_missing_client_fails_fast() {
    let store = store_with_email_send();
    let engine = engine(Arc::new(store.clone()));

    let result = engine
        .find_duplicate(
            &Contact::new(6).with_email("a@b.com"),
            &ContactClient::new(-1),
            &email_rule(),
            None,
            None,
            None,
        )
        .await;
    assert!(matches!(result, Err(CacheError::Configuration(_))));
    assert_eq!(store.total_calls(), 0);
}
