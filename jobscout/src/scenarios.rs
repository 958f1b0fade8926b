//! End-to-end scenarios: search, cache, then detail.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use crate::cancellation::CancellationToken;
use crate::config::JobScoutConfig;
use crate::errors::JobScoutError;
use crate::models::{DetailFailure, DetailOutcome, JobReference};
use crate::service::JobSearchService;
use crate::testing::{
    detail_page, listing_card, listing_page, CardSpec, DetailSpec, RecordingObserver, SlowFetcher,
    StaticFetcher,
};

const QUERY: &str = "hr admin jobs near winnetka within 5 miles";

fn results_page() -> String {
    listing_page(&[
        listing_card(
            &CardSpec::new("HR Administrator", "/job/hr-admin-1")
                .company("Acme Corp")
                .location("Winnetka, IL")
                .salary("$55,000 - $65,000")
                .recency("2 days ago")
                .id("acme-101"),
        ),
        listing_card(
            &CardSpec::new("Staff Accountant", "/job/accountant-2")
                .company("Lakeshore Partners")
                .id("lake-202"),
        ),
        listing_card(&CardSpec::new("Office Coordinator", "https://jobs.other.test/view/3")),
    ])
}

fn accountant_page() -> String {
    detail_page(
        &DetailSpec::new("Staff Accountant")
            .company("Lakeshore Partners")
            .location("Glencoe, IL")
            .job_type("Full-time")
            .requirement("CPA preferred")
            .requirement("3+ years general ledger experience")
            .body("Own month-end close for a growing firm."),
    )
}

fn service_with(fetcher: Arc<StaticFetcher>) -> JobSearchService {
    JobSearchService::builder().fetcher(fetcher).build().unwrap()
}

#[tokio::test]
async fn test_search_then_detail_by_sequence() {
    let fetcher = Arc::new(
        StaticFetcher::new()
            .with_default_page(results_page())
            .with_page("https://www.monster.com/job/accountant-2", accountant_page()),
    );
    let service = service_with(Arc::clone(&fetcher));

    let outcome = service.search(QUERY, None).await.unwrap();
    assert_eq!(outcome.total_found, 3);
    assert_eq!(outcome.parameters.job_title, "hr admin");
    assert_eq!(outcome.parameters.location, "winnetka");
    assert!(outcome
        .search_url
        .contains("q=hr+admin&where=winnetka&rd=5&page=1"));

    let numbers: Vec<u32> = outcome.jobs.iter().map(|j| j.sequence_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(outcome.jobs[0].salary, "$55,000 - $65,000");
    assert_eq!(outcome.jobs[2].company, "N/A");
    assert_eq!(outcome.jobs[2].source_url, "https://jobs.other.test/view/3");

    let detail = match service.detail(&JobReference::by_sequence(2)).await {
        DetailOutcome::Found(detail) => detail,
        other => panic!("expected found, got {}", other.status()),
    };
    assert_eq!(detail.summary.title, "Staff Accountant");
    assert_eq!(detail.summary.location, "Glencoe, IL");
    assert_eq!(detail.job_type, "Full-time");
    assert_eq!(detail.requirements.len(), 2);
    assert!(detail.full_text.contains("month-end close"));
    assert_eq!(
        fetcher.calls().last().map(String::as_str),
        Some("https://www.monster.com/job/accountant-2")
    );
}

#[tokio::test]
async fn test_detail_by_external_id_and_text() {
    let fetcher = Arc::new(
        StaticFetcher::new()
            .with_default_page(results_page())
            .with_page("https://www.monster.com/job/accountant-2", accountant_page()),
    );
    let service = service_with(fetcher);
    let outcome = service.search(QUERY, None).await.unwrap();

    let by_id = service.detail(&JobReference::by_external_id("lake-202")).await;
    assert!(by_id.is_found());

    let by_text = service
        .detail(&JobReference::by_text("the accountant one").in_session(&outcome.session_id))
        .await;
    assert_eq!(
        by_text.detail().map(|d| d.summary.sequence_number),
        Some(2)
    );
}

#[tokio::test]
async fn test_detail_on_empty_store_is_not_found() {
    let fetcher = Arc::new(StaticFetcher::new());
    let service = service_with(Arc::clone(&fetcher));

    match service.detail(&JobReference::by_sequence(999)).await {
        DetailOutcome::NotFound(not_found) => {
            assert_eq!(not_found.reference.sequence_number, Some(999));
            assert!(not_found.available.is_empty());
        }
        other => panic!("expected not_found, got {}", other.status()),
    }
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_number_lists_available_jobs() {
    let fetcher = Arc::new(StaticFetcher::new().with_default_page(results_page()));
    let service = service_with(fetcher);
    service.search(QUERY, None).await.unwrap();

    let outcome = service.detail(&JobReference::by_sequence(42)).await;
    let dict = outcome.to_dict();
    assert_eq!(dict.get("status"), Some(&serde_json::json!("not_found")));
    match outcome {
        DetailOutcome::NotFound(not_found) => {
            let titles: Vec<_> = not_found.available.iter().map(|b| b.title.as_str()).collect();
            assert_eq!(
                titles,
                vec!["HR Administrator", "Staff Accountant", "Office Coordinator"]
            );
        }
        other => panic!("expected not_found, got {}", other.status()),
    }
}

#[tokio::test]
async fn test_detail_timeout_is_partial_and_distinguishable() {
    let url = "https://www.monster.com/job/accountant-2";
    let fetcher = Arc::new(
        StaticFetcher::new()
            .with_default_page(results_page())
            .with_error(url, JobScoutError::timeout(url, 15.0)),
    );
    let service = service_with(fetcher);
    service.search(QUERY, None).await.unwrap();

    match service.detail(&JobReference::by_sequence(2)).await {
        DetailOutcome::Partial(partial) => {
            assert_eq!(partial.summary.title, "Staff Accountant");
            assert!(matches!(
                partial.failure,
                DetailFailure::Fetch(ref err) if err.is_timeout()
            ));
            assert!(partial.failure.is_retryable());
        }
        other => panic!("expected partial, got {}", other.status()),
    }

    // the cached summary is untouched by the failure
    assert_eq!(
        service.store().lookup_by_sequence(2).map(|j| j.company),
        Some("Lakeshore Partners".to_string())
    );
}

#[tokio::test]
async fn test_cancelled_detail_is_partial() {
    let store = {
        let fetcher = Arc::new(StaticFetcher::new().with_default_page(results_page()));
        let service = service_with(fetcher);
        service.search(QUERY, None).await.unwrap();
        Arc::clone(service.store())
    };

    let slow = JobSearchService::builder()
        .fetcher(Arc::new(SlowFetcher::new(Duration::from_secs(30))))
        .store(store)
        .build()
        .unwrap();
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel("user moved on");
    });

    let outcome = slow
        .detail_with_cancel(&JobReference::by_sequence(1), &token)
        .await;
    assert_eq!(outcome.status(), "partial");
    match outcome {
        DetailOutcome::Partial(partial) => assert!(matches!(
            partial.failure,
            DetailFailure::Fetch(JobScoutError::Cancelled { .. })
        )),
        other => panic!("expected partial, got {}", other.status()),
    }
}

#[tokio::test]
async fn test_search_fetch_failure_is_error_and_stores_nothing() {
    let fetcher = Arc::new(StaticFetcher::new());
    let service = service_with(fetcher);
    let url = service.search_url(&service.parse(QUERY)).to_string();

    let failing = Arc::new(StaticFetcher::new().with_error(&url, JobScoutError::timeout(&url, 15.0)));
    let service = service_with(failing);
    let err = service.search(QUERY, None).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_page_without_cards_is_empty_success() {
    let fetcher = Arc::new(
        StaticFetcher::new().with_default_page("<html><body><h2>No results</h2></body></html>"),
    );
    let service = service_with(fetcher);

    let outcome = service.search("underwater welder jobs in boise", None).await.unwrap();
    assert_eq!(outcome.total_found, 0);
    assert!(outcome.jobs.is_empty());
    assert_eq!(service.store().len(), 1);
}

#[tokio::test]
async fn test_eleventh_search_evicts_oldest() {
    let fetcher = Arc::new(StaticFetcher::new().with_default_page(results_page()));
    let service = service_with(fetcher);

    let mut ids = Vec::new();
    for i in 0..11 {
        let outcome = service
            .search(&format!("clerk {i} jobs near evanston"), Some(2))
            .await
            .unwrap();
        ids.push(outcome.session_id);
    }

    let store = service.store();
    assert_eq!(store.len(), 10);
    assert!(store.get_session(&ids[0]).is_none());
    assert!(store.get_session(&ids[10]).is_some());
    assert_eq!(store.recent_session().map(|s| s.session_id.clone()), Some(ids[10].clone()));
}

#[tokio::test]
async fn test_newest_session_wins_sequence_lookup() {
    let fetcher = Arc::new(StaticFetcher::new().with_default_page(results_page()));
    let service = service_with(Arc::clone(&fetcher));
    let first = service.search(QUERY, None).await.unwrap();

    let second_text = "barista jobs near skokie";
    let second_url = service.search_url(&service.parse(second_text)).to_string();
    fetcher.set_page(
        &second_url,
        listing_page(&[listing_card(&CardSpec::new("Barista", "/job/barista-9"))]),
    );
    let second = service.search(second_text, None).await.unwrap();

    assert_eq!(
        service.store().lookup_by_sequence(1).map(|j| j.title),
        Some("Barista".to_string())
    );
    assert_eq!(
        service
            .store()
            .lookup_in_session(&first.session_id, 1)
            .map(|j| j.title),
        Some("HR Administrator".to_string())
    );
    assert_ne!(first.session_id, second.session_id);
}

#[tokio::test]
async fn test_concurrent_searches_share_the_store() {
    let fetcher = Arc::new(StaticFetcher::new().with_default_page(results_page()));
    let service = Arc::new(service_with(fetcher));

    let handles = (0..8).map(|i| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.search(&format!("analyst {i} jobs near chicago"), None).await })
    });
    let results = futures::future::join_all(handles).await;

    let mut ids: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap().session_id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(service.store().len(), 8);
}

#[tokio::test]
async fn test_observer_sees_search_and_detail() {
    let observer = Arc::new(RecordingObserver::new());
    let detail_url = "https://www.monster.com/job/hr-admin-1";
    let fetcher = Arc::new(
        StaticFetcher::new()
            .with_default_page(results_page())
            .with_error(detail_url, JobScoutError::status(detail_url, 503, true)),
    );
    let service = JobSearchService::builder()
        .fetcher(fetcher)
        .observer(observer.clone())
        .build()
        .unwrap();

    let outcome = service.search(QUERY, Some(1)).await.unwrap();
    service.detail(&JobReference::by_sequence(1)).await;
    service.detail(&JobReference::by_sequence(5)).await;

    assert_eq!(
        observer.events(),
        vec![
            format!("search_start:{}", outcome.search_url),
            "search_complete:1".to_string(),
            "fetch_error:FetchFailure".to_string(),
            "detail_complete:partial".to_string(),
            "detail_complete:not_found".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_configured_defaults_flow_into_url() {
    let config = JobScoutConfig::default().with_overrides(|key| match key {
        "JOBSCOUT_DEFAULT_RADIUS" => Some("25".to_string()),
        "JOBSCOUT_BASE_URL" => Some("https://jobs.example.test/search".to_string()),
        _ => None,
    });
    let fetcher = Arc::new(StaticFetcher::new().with_default_page(results_page()));
    let service = JobSearchService::builder()
        .config(config)
        .fetcher(fetcher)
        .build()
        .unwrap();

    let outcome = service.search("nurse jobs near oak park", None).await.unwrap();
    assert!(outcome
        .search_url
        .starts_with("https://jobs.example.test/search?q=nurse&where=oak+park&rd=25"));
    assert_eq!(outcome.jobs[0].source_url, "https://jobs.example.test/job/hr-admin-1");
}
