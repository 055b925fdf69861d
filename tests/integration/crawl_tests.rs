//! Integration tests for the crawler
//!
//! Batch scheduling and failure isolation run against stub adapters; the
//! full crawl cycle runs end-to-end against a wiremock server.

use async_trait::async_trait;
use chrono::Utc;
use odds_crawler::adapters::{ExtractedMatch, LayoutMismatch, MatchListing};
use odds_crawler::config::parse_config;
use odds_crawler::crawler::{crawl, Coordinator};
use odds_crawler::storage::{open_storage, RunStatus};
use odds_crawler::{CrawlError, ExtractError, ExtractionState, Match, Site, SiteAdapter};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start and end instants of one extraction
#[derive(Debug, Clone, Copy)]
struct Span {
    start: Instant,
    end: Instant,
}

/// Adapter that sleeps for a per-URL time and records when each call ran
struct TimedAdapter {
    urls: Vec<String>,
    delays: HashMap<String, Duration>,
    failing: Vec<String>,
    mismatches: Vec<LayoutMismatch>,
    spans: Mutex<HashMap<String, Span>>,
}

impl TimedAdapter {
    fn new(count: usize) -> Self {
        let urls: Vec<String> = (0..count).map(|i| format!("https://bookmaker.test/m/{}", i)).collect();
        // Uneven delays so a batch only ends when its slowest task does
        let delays = urls
            .iter()
            .enumerate()
            .map(|(i, url)| (url.clone(), Duration::from_millis(20 + 15 * (i as u64 % 3))))
            .collect();

        Self {
            urls,
            delays,
            failing: Vec::new(),
            mismatches: Vec::new(),
            spans: Mutex::new(HashMap::new()),
        }
    }

    fn failing(mut self, index: usize) -> Self {
        self.failing.push(self.urls[index].clone());
        self
    }

    fn skipping(mut self, entry: usize, detail: &str) -> Self {
        self.mismatches.push(LayoutMismatch {
            entry,
            detail: detail.to_string(),
        });
        self
    }

    fn span(&self, index: usize) -> Span {
        self.spans.lock().unwrap()[&self.urls[index]]
    }
}

#[async_trait]
impl SiteAdapter for TimedAdapter {
    fn site(&self) -> Site {
        Site::Leon
    }

    async fn list_match_urls(&self, listing_url: &str) -> Result<MatchListing, ExtractError> {
        if listing_url.ends_with("/broken") {
            return Err(ExtractError::RenderTimeout {
                url: listing_url.to_string(),
                waiting_for: "div .sport-event-region".to_string(),
            });
        }
        Ok(MatchListing {
            urls: self.urls.clone(),
            mismatches: self.mismatches.clone(),
        })
    }

    async fn extract_match(&self, match_url: &str) -> Result<ExtractedMatch, ExtractError> {
        let start = Instant::now();
        tokio::time::sleep(self.delays[match_url]).await;
        let end = Instant::now();
        self.spans
            .lock()
            .unwrap()
            .insert(match_url.to_string(), Span { start, end });

        if self.failing.iter().any(|url| url == match_url) {
            return Err(ExtractError::LayoutMismatch {
                url: match_url.to_string(),
                detail: "no market list".to_string(),
            });
        }

        Ok(ExtractedMatch {
            match_id: 1,
            game: Match {
                team_a: "Team Spirit".to_string(),
                team_b: "Team Liquid".to_string(),
                start_time: Utc::now(),
                tournament: String::new(),
                url: match_url.to_string(),
            },
            bets: Vec::new(),
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batches_of_three_are_joined_before_next_batch() {
    let adapter = Arc::new(TimedAdapter::new(7));

    let report = Coordinator::new(3)
        .run(adapter.clone(), "https://bookmaker.test/list")
        .await
        .unwrap();

    assert_eq!(report.listed, 7);
    assert_eq!(report.stored, 7);
    assert_eq!(report.batches, 3);

    let batches: [&[usize]; 3] = [&[0, 1, 2], &[3, 4, 5], &[6]];
    for pair in batches.windows(2) {
        let (previous, next) = (pair[0], pair[1]);
        let previous_end = previous.iter().map(|&i| adapter.span(i).end).max().unwrap();
        let next_start = next.iter().map(|&i| adapter.span(i).start).min().unwrap();
        assert!(
            next_start >= previous_end,
            "batch {:?} started before batch {:?} finished",
            next,
            previous
        );
    }

    // All three tasks of the first batch overlap in time
    let first: Vec<Span> = (0..3).map(|i| adapter.span(i)).collect();
    let latest_start = first.iter().map(|s| s.start).max().unwrap();
    let earliest_end = first.iter().map(|s| s.end).min().unwrap();
    assert!(latest_start < earliest_end);
}

#[tokio::test]
async fn test_one_failure_does_not_stop_the_batch() {
    let adapter = Arc::new(TimedAdapter::new(5).failing(1));

    let report = Coordinator::new(3)
        .run(adapter.clone(), "https://bookmaker.test/list")
        .await
        .unwrap();

    assert_eq!(report.listed, 5);
    assert_eq!(report.stored, 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, "https://bookmaker.test/m/1");
    assert_eq!(report.failures[0].stage, ExtractionState::Extracting);

    // Every URL was attempted, including the failing one's batch siblings
    assert_eq!(adapter.spans.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn test_listing_failure_aborts_run() {
    let adapter = Arc::new(TimedAdapter::new(3));

    let result = Coordinator::new(3)
        .run(adapter.clone(), "https://bookmaker.test/broken")
        .await;

    match result {
        Err(CrawlError::Listing { url, source }) => {
            assert_eq!(url, "https://bookmaker.test/broken");
            assert!(matches!(source, ExtractError::RenderTimeout { .. }));
        }
        other => panic!("expected listing failure, got {:?}", other),
    }
    assert!(adapter.spans.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_mismatches_are_reported_without_stopping_the_run() {
    let adapter = Arc::new(
        TimedAdapter::new(2)
            .skipping(1, "match entry has no link")
            .skipping(3, "match entry has no link"),
    );

    let report = Coordinator::new(3)
        .run(adapter.clone(), "https://bookmaker.test/list")
        .await
        .unwrap();

    assert_eq!(report.listed, 2);
    assert_eq!(report.stored, 2);
    assert!(report.is_complete());
    assert_eq!(
        report.mismatches,
        vec![
            LayoutMismatch {
                entry: 1,
                detail: "match entry has no link".to_string(),
            },
            LayoutMismatch {
                entry: 3,
                detail: "match entry has no link".to_string(),
            },
        ]
    );
}

// ===== End-to-end against a mock bookmaker =====

const LISTING: &str = r#"<html><body><div class="page"><div class="sport-event-region">
    <div data-test-el="sportline-event-block"><div class="row"><a href="/bets/esports/dota2/match-1">Spirit - GG</a></div></div>
    <div data-test-el="sportline-event-block"><div class="row"><a href="/bets/esports/dota2/match-2">Tundra - Liquid</a></div></div>
    <div data-test-el="sportline-event-block"><div class="row"><span>Soon</span></div></div>
    <div data-test-el="sportline-event-block"><div class="row"><a href="/bets/esports/dota2/match-3">BB - Falcons</a></div></div>
</div></div></body></html>"#;

fn match_page(team_a: &str, team_b: &str) -> String {
    format!(
        r#"<html><body><div class="layout"><div class="sport-event-details">
            <div class="breadcrumbs">
                <div class="breadcrumb__title">Киберспорт</div>
                <div class="breadcrumb__title">DreamLeague S24</div>
                <div class="breadcrumb__title">{a} - {b}</div>
            </div>
            <div class="headline">
                <div class="headline-info__team">{a}</div>
                <div class="headline-info__date"><span>12 Окт 2024</span><span>18:30</span></div>
                <div class="headline-info__team">{b}</div>
            </div>
            <div class="sport-event-details-market-list_pY0E1">
                <div class="sport-event-details__markets_G3m4g">
                    <div class="column">
                        <div class="group">
                            <div class="sport-event-details-market-group__title">Победитель</div>
                            <div class="sport-event-details-item__runner-holder"><button><span>{a}</span><span>1.85</span></button></div>
                            <div class="sport-event-details-item__runner-holder"><button><span>{b}</span><span>1.95</span></button></div>
                        </div>
                    </div>
                </div>
            </div>
        </div></div></body></html>"#,
        a = team_a,
        b = team_b
    )
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.into())
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_full_crawl_against_mock_bookmaker() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/bets/esports/dota2"))
        .respond_with(html(LISTING))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bets/esports/dota2/match-1"))
        .respond_with(html(match_page("Team Spirit", "Gaimin Gladiators")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bets/esports/dota2/match-2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bets/esports/dota2/match-3"))
        .respond_with(html(match_page("BetBoom", "Team Falcons")))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("odds.db");
    let config = parse_config(&format!(
        r#"
        [crawler]
        site = "leon"
        listing-url = "{base}/bets/esports/dota2"
        base-url = "{base}/"
        batch-size = 3
        render-timeout-secs = 2

        [renderer]
        poll-interval-ms = 50

        [database]
        path = "{db}"
        "#,
        base = base_url,
        db = db_path.display()
    ))
    .unwrap();

    let report = crawl(&config, "test-hash").await.unwrap();

    assert_eq!(report.listed, 3);
    assert_eq!(report.stored, 2);
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].entry, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].url,
        format!("{}/bets/esports/dota2/match-2", base_url)
    );
    assert_eq!(report.failures[0].stage, ExtractionState::Rendering);

    let storage = open_storage(&db_path).unwrap();
    assert_eq!(storage.count_matches().unwrap(), 2);
    assert_eq!(storage.count_bets().unwrap(), 2);
    assert_eq!(storage.count_options().unwrap(), 4);

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.site, "leon");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.matches_stored, 2);
    assert_eq!(run.matches_failed, 1);
}

#[tokio::test]
async fn test_crawl_marks_run_failed_when_listing_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bets/esports/dota2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("odds.db");
    let config = parse_config(&format!(
        r#"
        [crawler]
        site = "leon"
        listing-url = "{base}/bets/esports/dota2"
        base-url = "{base}/"

        [database]
        path = "{db}"
        "#,
        base = server.uri(),
        db = db_path.display()
    ))
    .unwrap();

    let result = crawl(&config, "test-hash").await;
    assert!(matches!(result, Err(CrawlError::Listing { .. })));

    let storage = open_storage(&db_path).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(storage.count_matches().unwrap(), 0);
}
