// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /spotlight (shape, cache reuse, refresh=true)
// - GET /livefeed  (shape, limit/hasMore, bad category → 400)

use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use pulse_aggregator::config::AppConfig;
use pulse_aggregator::sources::{SourceDescriptor, SourceKind};
use pulse_aggregator::{router, AppState, GetterRegistry, NewsItem, PubDate, SourceId, SourceTable};

const BODY_LIMIT: usize = 1024 * 1024;

fn sid(s: &str) -> SourceId {
    SourceId::new(s).expect("valid id")
}

fn desc(id: &str, kind: SourceKind) -> SourceDescriptor {
    SourceDescriptor {
        id: sid(id),
        name: id.to_uppercase(),
        color: "green".into(),
        kind,
        column: None,
        disable: None,
        redirect: None,
        feed: None,
    }
}

fn test_router() -> Router {
    let table = SourceTable::new(vec![
        desc("h1", SourceKind::Hottest),
        desc("h2", SourceKind::Hottest),
        desc("h3", SourceKind::Hottest),
        desc("rt", SourceKind::Realtime),
    ])
    .unwrap();

    let mut reg = GetterRegistry::new();
    for id in ["h1", "h2", "h3"] {
        reg.register_fn(sid(id), move || async move {
            Ok::<_, anyhow::Error>(vec![
                NewsItem::new(format!("{id}-1"), "#热搜话题#冲上榜首", format!("https://{id}/1")),
                NewsItem::new(format!("{id}-2"), format!("独有{id}新闻"), format!("https://{id}/2")),
            ])
        });
    }
    reg.register_fn(sid("rt"), || async {
        Ok::<_, anyhow::Error>(vec![
            NewsItem::new("a", "older", "https://rt/a").with_pub_date(PubDate::Millis(1_000)),
            NewsItem::new("b", "newer", "https://rt/b")
                .with_pub_date(PubDate::Text("2024-01-01T00:00:00Z".into())),
        ])
    });

    router(AppState::new(&AppConfig::default(), table, reg))
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("router response");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, json)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("router response");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn spotlight_returns_camel_case_topics() {
    let app = test_router();
    let (status, json) = get_json(&app, "/spotlight").await;
    assert_eq!(status, StatusCode::OK);

    let topics = json["topics"].as_array().expect("topics array");
    assert_eq!(topics.len(), 1);
    let t = &topics[0];
    assert_eq!(t["keyword"], "热搜话题");
    assert_eq!(t["platformCount"], 3);
    assert_eq!(t["maxRank"], 1);
    assert_eq!(t["platforms"][0]["sourceId"], "h1");
    assert_eq!(t["platforms"][0]["sourceName"], "H1");
    assert!(t["firstSeenAt"].is_string());
    assert!(json["updatedAt"].is_string());
}

#[tokio::test]
async fn spotlight_reuses_cache_unless_refresh_true() {
    let app = test_router();
    let (_, first) = get_json(&app, "/spotlight").await;
    let (_, second) = get_json(&app, "/spotlight?refresh=false").await;
    assert_eq!(first["updatedAt"], second["updatedAt"]);
    assert_eq!(first["topics"], second["topics"]);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (status, forced) = get_json(&app, "/spotlight?refresh=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(first["updatedAt"], forced["updatedAt"]);
}

#[tokio::test]
async fn livefeed_shape_and_has_more() {
    let app = test_router();
    let (status, json) = get_json(&app, "/livefeed?category=all&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    let items = json["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "newer");
    assert_eq!(items[0]["id"], "livefeed-rt-b");
    assert_eq!(items[0]["sourceColor"], "green");
    assert_eq!(items[0]["pubDate"], "2024-01-01T00:00:00.000Z");
    assert!(items[0].get("mobileUrl").is_none());
    assert_eq!(json["hasMore"], true);

    let (_, all) = get_json(&app, "/livefeed").await;
    assert_eq!(all["items"].as_array().unwrap().len(), 2);
    assert_eq!(all["hasMore"], false);
}

#[tokio::test]
async fn livefeed_unknown_category_is_400() {
    let app = test_router();
    let (status, json) = get_json(&app, "/livefeed?category=sports").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("sports"));
}
