//! End-to-end pipeline runs against in-memory mocks.

use std::sync::Arc;
use std::time::Duration;

use pricescout_archive::FetchOutcome;
use pricescout_common::{ExtractionMethod, PriceScoutError, SearchRequest, SourceStatus};
use pricescout_scout::testing::{blocked, page_text, MockFetcher, MockReasoner};
use pricescout_scout::{Orchestrator, PriceScout, ReasoningMode, RenderSlot};

const PAYLOAD: &str = r#"{"comparison_table":[{"website":"takealot.com","brand":"Defy","product":"Kettle","original_price":"R 399","sale_price":"R 299","extra_discounts":"None","product_url":"https://www.takealot.com/kettle","comment":""}],"top_recommendation":"Defy at Takealot"}"#;

fn request(sites: &[&str]) -> SearchRequest {
    SearchRequest {
        product_name: "kettle".to_string(),
        brands: vec!["Defy".to_string()],
        websites: sites.iter().map(|s| s.to_string()).collect(),
    }
}

fn generic_url(site: &str) -> String {
    format!("https://{site}/search?q=kettle")
}

#[tokio::test]
async fn results_follow_site_order_regardless_of_path() {
    let (a, b, c) = (generic_url("a.example"), generic_url("b.example"), generic_url("c.example"));
    let fetcher = Arc::new(
        MockFetcher::new()
            .on_lightweight(&b, page_text(&b, "B kettle R 250"))
            .on_render(&a, FetchOutcome::Content(page_text(&a, "A kettle R 240")))
            .on_render(&c, FetchOutcome::Content(page_text(&c, "C kettle R 260"))),
    );
    let orchestrator = Orchestrator::new(fetcher, RenderSlot::new());

    let acquisition = orchestrator
        .acquire(&request(&["a.example", "b.example", "c.example"]))
        .await
        .unwrap();

    let sites: Vec<_> = acquisition.results.iter().map(|r| r.site.as_str()).collect();
    assert_eq!(sites, vec!["a.example", "b.example", "c.example"]);

    let text = acquisition.corpus.as_text();
    let (pa, pb, pc) = (
        text.find("A kettle").unwrap(),
        text.find("B kettle").unwrap(),
        text.find("C kettle").unwrap(),
    );
    assert!(pa < pb && pb < pc);
    assert_eq!(acquisition.results[0].method, ExtractionMethod::Rendered);
    assert_eq!(acquisition.results[1].method, ExtractionMethod::Lightweight);
}

#[tokio::test]
async fn first_site_finishing_last_keeps_site_order() {
    let (a, b, c) = (generic_url("a.example"), generic_url("b.example"), generic_url("c.example"));
    let fetcher = Arc::new(
        MockFetcher::new()
            .on_lightweight(&a, page_text(&a, "A kettle R 240"))
            .on_lightweight(&b, page_text(&b, "B kettle R 250"))
            .on_lightweight(&c, page_text(&c, "C kettle R 260"))
            .lightweight_delay(&a, Duration::from_millis(60))
            .lightweight_delay(&b, Duration::from_millis(30)),
    );
    let orchestrator = Orchestrator::new(fetcher.clone(), RenderSlot::new());

    let acquisition = orchestrator
        .acquire(&request(&["a.example", "b.example", "c.example"]))
        .await
        .unwrap();

    assert_eq!(fetcher.lightweight_completions(), vec![c.clone(), b.clone(), a.clone()]);

    let urls: Vec<_> = acquisition.results.iter().map(|r| r.url.clone()).collect();
    assert_eq!(urls, vec![a, b, c]);

    let text = acquisition.corpus.as_text();
    let (pa, pb, pc) = (
        text.find("A kettle").unwrap(),
        text.find("B kettle").unwrap(),
        text.find("C kettle").unwrap(),
    );
    assert!(pa < pb && pb < pc);
    assert!(fetcher.render_calls().is_empty());
}

#[tokio::test]
async fn lightweight_fetches_run_concurrently() {
    let sites = ["a.example", "b.example", "c.example", "d.example"];
    let mut mock = MockFetcher::new();
    for site in sites {
        let url = generic_url(site);
        mock = mock
            .on_lightweight(&url, page_text(&url, "kettle R 1"))
            .lightweight_delay(&url, Duration::from_millis(30));
    }
    let fetcher = Arc::new(mock);
    let orchestrator = Orchestrator::new(fetcher.clone(), RenderSlot::new());

    orchestrator.acquire(&request(&sites)).await.unwrap();

    assert_eq!(fetcher.peak_concurrent_lightweight(), sites.len());
}

#[tokio::test]
async fn one_render_failure_does_not_abort_the_rest() {
    let (a, b) = (generic_url("a.example"), generic_url("b.example"));
    let fetcher = Arc::new(
        MockFetcher::new()
            .on_render(&a, FetchOutcome::Failed("navigation timeout".to_string()))
            .on_render(&b, FetchOutcome::Content(page_text(&b, "B kettle R 250"))),
    );
    let orchestrator = Orchestrator::new(fetcher.clone(), RenderSlot::new());

    let acquisition = orchestrator
        .acquire(&request(&["a.example", "b.example"]))
        .await
        .unwrap();

    assert_eq!(acquisition.results.len(), 2);
    assert_eq!(acquisition.results[0].status, SourceStatus::Failed);
    assert_eq!(acquisition.results[0].method, ExtractionMethod::None);
    assert_eq!(acquisition.results[1].status, SourceStatus::Ok);
    assert_eq!(fetcher.render_calls(), vec![a, b]);
}

#[tokio::test]
async fn blocked_lightweight_page_is_rendered_and_block_is_reported() {
    let url = generic_url("shop.example");
    let fetcher = Arc::new(
        MockFetcher::new()
            .on_lightweight(&url, blocked(&url))
            .on_render(&url, FetchOutcome::Content(blocked(&url))),
    );
    let orchestrator = Orchestrator::new(fetcher.clone(), RenderSlot::new());

    let acquisition = orchestrator.acquire(&request(&["shop.example"])).await.unwrap();

    assert_eq!(fetcher.render_calls().len(), 1);
    assert_eq!(acquisition.results[0].status, SourceStatus::Blocked);
    assert!(acquisition.corpus.as_text().contains("BLOCKED:"));
}

#[tokio::test]
async fn overlapping_requests_never_render_concurrently() {
    let sites = ["a.example", "b.example", "c.example"];
    let mut mock = MockFetcher::new().render_delay(Duration::from_millis(20));
    for site in sites {
        let url = generic_url(site);
        mock = mock.on_render(&url, FetchOutcome::Content(page_text(&url, "kettle R 1")));
    }
    let fetcher = Arc::new(mock);
    let slot = RenderSlot::new();

    let first = Orchestrator::new(fetcher.clone(), slot.clone());
    let second = Orchestrator::new(fetcher.clone(), slot.clone());
    let third = Orchestrator::new(fetcher.clone(), slot.clone());
    let req = request(&sites);

    let (r1, r2, r3) = tokio::join!(first.acquire(&req), second.acquire(&req), third.acquire(&req));

    assert!(r1.is_ok() && r2.is_ok() && r3.is_ok());
    assert_eq!(fetcher.render_calls().len(), 9);
    assert_eq!(fetcher.peak_concurrent_renders(), 1);
    assert!(slot.is_free());
}

#[tokio::test]
async fn independent_slots_do_not_serialize_each_other() {
    let url = generic_url("a.example");
    let fetcher = Arc::new(
        MockFetcher::new()
            .render_delay(Duration::from_millis(50))
            .on_render(&url, FetchOutcome::Content(page_text(&url, "kettle"))),
    );
    let first = Orchestrator::new(fetcher.clone(), RenderSlot::new());
    let second = Orchestrator::new(fetcher.clone(), RenderSlot::new());
    let req = request(&["a.example"]);

    let _ = tokio::join!(first.acquire(&req), second.acquire(&req));

    assert_eq!(fetcher.peak_concurrent_renders(), 2);
}

#[tokio::test]
async fn exhausted_acquisition_never_calls_the_reasoner() {
    let scout = PriceScout::new(Arc::new(MockFetcher::new()), RenderSlot::new());
    let reasoner = MockReasoner::new().respond(PAYLOAD);

    let err = scout
        .analyze(&request(&["a.example", "b.example"]), &reasoner)
        .await
        .unwrap_err();

    assert!(matches!(err, PriceScoutError::AcquisitionExhausted { sites: 2 }));
    assert!(reasoner.calls().is_empty());
}

#[tokio::test]
async fn empty_primary_response_gets_exactly_one_strict_retry() {
    let url = "https://www.takealot.com/all?q=kettle";
    let fetcher = Arc::new(MockFetcher::new().on_lightweight(url, page_text(url, "Defy kettle R 299")));
    let scout = PriceScout::new(fetcher, RenderSlot::new());
    let reasoner = MockReasoner::new().respond("").respond(PAYLOAD);

    let result = scout.analyze(&request(&["takealot.com"]), &reasoner).await.unwrap();

    assert_eq!(result.top_recommendation, "Defy at Takealot");
    assert_eq!(
        reasoner.modes(),
        vec![ReasoningMode::SearchAugmented, ReasoningMode::StrictJson]
    );
    let user = &reasoner.calls()[0].user;
    assert!(user.contains(&format!("--- SOURCE: {url} [page text, lightweight] ---")));
}

#[tokio::test]
async fn two_empty_responses_fail_the_request() {
    let url = "https://www.takealot.com/all?q=kettle";
    let fetcher = Arc::new(MockFetcher::new().on_lightweight(url, page_text(url, "Defy kettle R 299")));
    let scout = PriceScout::new(fetcher, RenderSlot::new());
    let reasoner = MockReasoner::new().respond("").respond("   ");

    let err = scout.analyze(&request(&["takealot.com"]), &reasoner).await.unwrap_err();

    assert!(matches!(err, PriceScoutError::AnalysisFailed(_)));
    assert_eq!(reasoner.calls().len(), 2);
}
