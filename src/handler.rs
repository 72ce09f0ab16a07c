//! The card endpoint.
//!
//! One linear request/response transformation: bind every query parameter,
//! run the policy checks, fetch, render. Each fallible stage returns a
//! [`CardError`] and exactly one place converts that into an error card, so
//! the response body is an SVG no matter what went wrong.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::collections::HashMap;
use std::sync::Arc;

use crate::blacklist;
use crate::cache;
use crate::card;
use crate::error::CardError;
use crate::github::{StatsFetcher, StatsRequest};
use crate::locale;
use crate::params::CardParams;

pub struct AppState {
    pub fetcher: Arc<dyn StatsFetcher>,
    /// `CACHE_SECONDS` from the environment, captured once at startup.
    pub cache_override: Option<u32>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(stats_card))
        .route("/api", get(stats_card))
        .with_state(state)
}

pub async fn stats_card(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    // Bound before anything can fail, so the error card always has the
    // requested theme context.
    let params = CardParams::from_query(&query);

    if let Some(username) = params.username.as_deref() {
        if blacklist::is_blacklisted(username) {
            tracing::info!(username, "refused blacklisted username");
            let svg = card::render_error("This username is blacklisted", "", &params);
            return svg_response(StatusCode::OK, cache::error_cache_control(), svg);
        }
    }

    if let Some(locale) = params.locale.as_deref() {
        if !locale::is_locale_available(locale) {
            tracing::info!(locale, "unsupported locale requested");
            let svg = card::render_error("Language not found", "", &params);
            return svg_response(StatusCode::OK, cache::error_cache_control(), svg);
        }
    }

    match generate_card(&state, &params).await {
        Ok((svg, seconds)) => {
            svg_response(StatusCode::OK, cache::success_cache_control(seconds), svg)
        }
        Err(err) => {
            tracing::warn!(error = %err, "card generation failed");
            let secondary = err.secondary_message().unwrap_or_default();
            let svg = card::render_error(&err.to_string(), &secondary, &params);
            svg_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                cache::error_cache_control(),
                svg,
            )
        }
    }
}

async fn generate_card(
    state: &AppState,
    params: &CardParams,
) -> Result<(String, u32), CardError> {
    let username = params.username.clone().ok_or(CardError::MissingUsername)?;

    let request = StatsRequest {
        username,
        include_all_commits: params.include_all_commits,
        exclude_repos: params.exclude_repo.clone(),
        include_merged_prs: params.shows("prs_merged") || params.shows("prs_merged_percentage"),
        include_discussions_started: params.shows("discussions_started"),
        include_discussions_answered: params.shows("discussions_answered"),
    };

    let stats = state.fetcher.fetch_stats(&request).await?;
    let seconds =
        cache::resolve_cache_seconds(params.cache_seconds.as_deref(), state.cache_override);
    let svg = card::render_stats_card(&stats, params);
    Ok((svg, seconds))
}

fn svg_response(status: StatusCode, cache_control: String, body: String) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "image/svg+xml".to_string()),
            (header::CACHE_CONTROL, cache_control),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::stats::Stats;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct FixedStats(Stats);

    #[async_trait]
    impl StatsFetcher for FixedStats {
        async fn fetch_stats(&self, _request: &StatsRequest) -> Result<Stats, FetchError> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl StatsFetcher for FailingFetcher {
        async fn fetch_stats(&self, request: &StatsRequest) -> Result<Stats, FetchError> {
            Err(FetchError::UserNotFound {
                username: request.username.clone(),
            })
        }
    }

    /// Records the request it was handed, for asserting derived flags.
    struct CaptureFetcher(Mutex<Option<StatsRequest>>);

    #[async_trait]
    impl StatsFetcher for CaptureFetcher {
        async fn fetch_stats(&self, request: &StatsRequest) -> Result<Stats, FetchError> {
            *self.0.lock().unwrap() = Some(request.clone());
            Ok(Stats::default())
        }
    }

    fn sample_stats() -> Stats {
        Stats {
            name: "Linus Torvalds".to_string(),
            total_stars: 150_000,
            total_commits: 4_000,
            total_prs: 120,
            total_issues: 40,
            contributed_to: 30,
            followers: 180_000,
            ..Default::default()
        }
    }

    fn app(fetcher: Arc<dyn StatsFetcher>, cache_override: Option<u32>) -> Router {
        router(Arc::new(AppState {
            fetcher,
            cache_override,
        }))
    }

    async fn get_card(app: Router, uri: &str) -> (StatusCode, HeaderMap, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
        headers.get(name).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn renders_a_card_with_cache_headers() {
        let app = app(Arc::new(FixedStats(sample_stats())), None);
        let (status, headers, body) = get_card(app, "/?username=torvalds&theme=dark").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(header(&headers, "content-type"), "image/svg+xml");
        assert_eq!(
            header(&headers, "cache-control"),
            "max-age=43200, s-maxage=43200, stale-while-revalidate=86400"
        );
        assert!(body.starts_with("<svg"));
        assert!(body.contains("Linus Torvalds"));
    }

    #[tokio::test]
    async fn cache_seconds_is_clamped() {
        let app = app(Arc::new(FixedStats(sample_stats())), None);
        let (_, headers, _) = get_card(app, "/?username=torvalds&cache_seconds=99999999").await;
        assert!(header(&headers, "cache-control").starts_with("max-age=172800"));
    }

    #[tokio::test]
    async fn env_override_beats_the_clamp() {
        let app = app(Arc::new(FixedStats(sample_stats())), Some(60));
        let (_, headers, _) = get_card(app, "/?username=torvalds&cache_seconds=86400").await;
        assert!(header(&headers, "cache-control").starts_with("max-age=60,"));
    }

    #[tokio::test]
    async fn blacklisted_username_gets_an_error_card() {
        // The fetcher would fail; the blacklist check must short-circuit first.
        let app = app(Arc::new(FailingFetcher), None);
        let (status, headers, body) = get_card(app, "/?username=renovate-bot&theme=dark").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(header(&headers, "content-type"), "image/svg+xml");
        assert!(body.contains("This username is blacklisted"));
    }

    #[tokio::test]
    async fn unsupported_locale_gets_an_error_card() {
        let app = app(Arc::new(FixedStats(sample_stats())), None);
        let (status, _, body) = get_card(app, "/?username=torvalds&locale=xx-unsupported").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Language not found"));
    }

    #[tokio::test]
    async fn missing_username_is_a_server_error_card() {
        let app = app(Arc::new(FailingFetcher), None);
        let (status, headers, body) = get_card(app, "/?theme=dark").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            header(&headers, "cache-control"),
            "max-age=300, s-maxage=600, stale-while-revalidate=86400"
        );
        assert!(body.starts_with("<svg"));
        assert!(body.contains("username"));
    }

    #[tokio::test]
    async fn fetch_failure_becomes_an_error_card() {
        let app = app(Arc::new(FailingFetcher), None);
        let (status, headers, body) = get_card(app, "/?username=ghost").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(header(&headers, "content-type"), "image/svg+xml");
        assert!(body.contains("Could not fetch user"));
        assert!(body.contains("ghost"));
    }

    #[tokio::test]
    async fn error_card_keeps_the_requested_theme() {
        let app = app(Arc::new(FailingFetcher), None);
        let (_, _, body) = get_card(app, "/?username=ghost&theme=dark").await;
        assert!(body.contains("#151515"));
    }

    #[tokio::test]
    async fn show_list_drives_the_fetch_flags() {
        let capture = Arc::new(CaptureFetcher(Mutex::new(None)));
        let app = app(capture.clone(), None);
        let _ = get_card(
            app,
            "/?username=torvalds&show=prs_merged_percentage,discussions_answered&exclude_repo=linux,subsurface",
        )
        .await;

        let request = capture.0.lock().unwrap().clone().unwrap();
        assert!(request.include_merged_prs);
        assert!(!request.include_discussions_started);
        assert!(request.include_discussions_answered);
        assert_eq!(request.exclude_repos, vec!["linux", "subsurface"]);
    }

    #[tokio::test]
    async fn api_alias_serves_the_same_card() {
        let app = app(Arc::new(FixedStats(sample_stats())), None);
        let (status, _, body) = get_card(app, "/api?username=torvalds").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Linus Torvalds"));
    }
}
