mod mocks;

use contact_cache::domain::Scope;
use contact_cache::error::CacheError;
use contact_cache::models::{ContactClient, LimitRule};
use contact_cache::services::MatchService;
use mocks::fixtures::{days_ago, engine, sent};
use mocks::MockCacheStore;
use std::sync::Arc;

fn store_with_sends(client_id: i64, days: &[i64]) -> MockCacheStore {
    let store = MockCacheStore::new();
    for (i, d) in days.iter().enumerate() {
        store.add_record(sent(i as i64 + 1, client_id, 100 + i as i64, *d));
    }
    store
}

#[tokio::test]
async fn test_first_exceeded_rule_wins() {
    let store = store_with_sends(9, &[1, 2, 3]);
    let engine = engine(Arc::new(store.clone()));
    let rules = vec![
        LimitRule::new(Scope::GLOBAL, "P7D", 10),
        LimitRule::new(Scope::GLOBAL, "P7D", 2),
        LimitRule::new(Scope::GLOBAL, "P7D", 0),
    ];

    let hit = engine
        .find_limit(&ContactClient::new(9), &rules, None, None)
        .await
        .unwrap()
        .expect("second rule should trip");

    assert_eq!(hit.rule, rules[1]);
    assert_eq!(hit.count, 3);
    assert_eq!(store.get_call_count("count"), 2);
    assert_eq!(engine.metrics().limit_hits_total(), 1);
}

#[tokio::test]
async fn test_count_equal_to_quantity_does_not_trip() {
    let store = store_with_sends(9, &[1, 2, 3]);
    let engine = engine(Arc::new(store.clone()));
    let rules = vec![LimitRule::new(Scope::GLOBAL, "P7D", 3)];

    let result = engine
        .find_limit(&ContactClient::new(9), &rules, None, None)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_only_destination_client_counts() {
    let store = store_with_sends(9, &[1, 2]);
    store.add_record(sent(10, 10, 500, 1));
    store.add_record(sent(11, 10, 501, 1));
    let engine = engine(Arc::new(store));
    let rules = vec![LimitRule::new(Scope::GLOBAL, "P7D", 2)];

    let result = engine
        .find_limit(&ContactClient::new(9), &rules, None, None)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_calendar_month_versus_rolling_month() {
    // 25 days before 2024-05-20 is in April: outside "this month", inside "the last month".
    let store = store_with_sends(9, &[25, 2]);
    let engine = engine(Arc::new(store));
    let client = ContactClient::new(9);

    let calendar = vec![LimitRule::new(Scope::GLOBAL, "1M", 1)];
    assert!(engine
        .find_limit(&client, &calendar, None, None)
        .await
        .unwrap()
        .is_none());

    let rolling = vec![LimitRule::new(Scope::GLOBAL, "P1M", 1)];
    let hit = engine
        .find_limit(&client, &rolling, None, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.count, 2);
}

#[tokio::test]
async fn test_malformed_duration_counts_like_one_month() {
    let store = store_with_sends(9, &[25, 2]);
    let engine = engine(Arc::new(store));
    let rules = vec![LimitRule::new(Scope::GLOBAL, "Qx", 1)];

    let hit = engine
        .find_limit(&ContactClient::new(9), &rules, None, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.count, 2);
}

#[tokio::test]
async fn test_utm_source_scope_narrows_to_source() {
    let store = MockCacheStore::new();
    for (id, source) in [(1, "google"), (2, "google"), (3, "bing")] {
        let mut record = sent(id, 9, 100 + id, 1);
        record.utm_source = Some(source.to_string());
        store.add_record(record);
    }
    let engine = engine(Arc::new(store));
    let client = ContactClient::new(9);

    let google = vec![LimitRule::new(Scope::UTM_SOURCE, "P7D", 1).with_value("google")];
    let hit = engine.find_limit(&client, &google, None, None).await.unwrap().unwrap();
    assert_eq!(hit.count, 2);

    let bing = vec![LimitRule::new(Scope::UTM_SOURCE, "P7D", 1).with_value("bing")];
    assert!(engine.find_limit(&client, &bing, None, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_category_value_reads_integer_prefix() {
    let store = MockCacheStore::new();
    let mut tagged = sent(1, 9, 101, 1);
    tagged.category_id = Some(7);
    store.add_records(vec![tagged, sent(2, 9, 102, 1)]);
    let engine = engine(Arc::new(store));
    let client = ContactClient::new(9);

    let other_category = vec![LimitRule::new(Scope::CATEGORY, "P7D", 1).with_value("12abc")];
    assert!(engine
        .find_limit(&client, &other_category, None, None)
        .await
        .unwrap()
        .is_none());

    let same_category = vec![LimitRule::new(Scope::CATEGORY, "P7D", 0).with_value("7 (retail)")];
    let hit = engine
        .find_limit(&client, &same_category, None, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.count, 1);
}

#[tokio::test]
async fn test_back_dated_send_time_moves_window() {
    let store = store_with_sends(9, &[12, 13]);
    let engine = engine(Arc::new(store));
    let client = ContactClient::new(9);
    let rules = vec![LimitRule::new(Scope::GLOBAL, "P7D", 1)];

    assert!(engine.find_limit(&client, &rules, None, None).await.unwrap().is_none());

    let hit = engine
        .find_limit(&client, &rules, None, Some(days_ago(10)))
        .await
        .unwrap();
    assert_eq!(hit.map(|h| h.count), Some(2));
}

#[tokio::test]
async fn test_rules_from_client_json() {
    let store = store_with_sends(9, &[1, 2, 3]);
    let engine = engine(Arc::new(store));
    let rules = LimitRule::list_from_json(
        r#"[{"scope": 1, "duration": "1D", "quantity": 5},
            {"scope": 1, "duration": "P7D", "quantity": 2}]"#,
    )
    .unwrap();

    let hit = engine
        .find_limit(&ContactClient::new(9), &rules, Some("America/New_York"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.rule.duration, "P7D");
}

#[tokio::test]
async fn test_store_failure_is_surfaced() {
    let store = store_with_sends(9, &[1]);
    store.fail_with("connection refused");
    let engine = engine(Arc::new(store));
    let rules = vec![LimitRule::new(Scope::GLOBAL, "P7D", 0)];

    let err = engine
        .find_limit(&ContactClient::new(9), &rules, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Store(_)));
    assert!(err.is_retriable());
}
