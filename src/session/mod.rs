//! Cookie-bearing HTTP session against the railway booking site.
//!
//! The token pair on the search page is bound to the session cookies, so
//! the token fetch and the following submission must go through the same
//! [`RailwaySession`].

use std::sync::LazyLock;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use scraper::{Html, Selector};
use tracing::debug;

use crate::config::SiteConfig;
use crate::error::CheckError;
use crate::form::{FormFields, build_form};
use crate::models::{AvailabilityReport, SearchRequest, SearchTokens};
use crate::results::parse_results;
use crate::traits::{SessionFactory, WindowSearch};

static QUERY_FORM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form#queryForm").unwrap());
static CSRF_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="_csrf"]"#).unwrap());
static COMPLETE_TOKEN_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="completeToken"]"#).unwrap());

/// Extract the token pair from the search page.
///
/// Only a missing form is fatal; a missing input leaves its token empty.
pub fn extract_tokens(html: &str, url: &str) -> Result<SearchTokens, CheckError> {
    let document = Html::parse_document(html);
    let form = document
        .select(&QUERY_FORM)
        .next()
        .ok_or_else(|| CheckError::TokenNotFound {
            url: url.to_string(),
        })?;

    let value_of = |selector: &Selector| {
        form.select(selector)
            .next()
            .and_then(|input| input.value().attr("value"))
            .unwrap_or_default()
            .to_string()
    };

    Ok(SearchTokens {
        csrf: value_of(&CSRF_INPUT),
        complete_token: value_of(&COMPLETE_TOKEN_INPUT),
    })
}

fn ensure_success(response: Response, url: &str) -> Result<Response, CheckError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(CheckError::Status {
            url: url.to_string(),
            status: response.status(),
        })
    }
}

/// Browser-like headers sent on every request of the session.
fn default_headers(site: &SiteConfig) -> Result<HeaderMap, CheckError> {
    let value = |v: &str| {
        HeaderValue::from_str(v).map_err(|e| CheckError::config(format!("header value `{v}`: {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        value("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")?,
    );
    headers.insert(header::ACCEPT_LANGUAGE, value("zh-TW,zh;q=0.9,en;q=0.8")?);
    headers.insert(header::ORIGIN, value(&site.base_url)?);
    headers.insert(header::REFERER, value(&site.query_page_url())?);
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, value("1")?);
    Ok(headers)
}

/// One cookie jar plus the endpoints it talks to.
#[derive(Clone)]
pub struct RailwaySession {
    client: Client,
    site: SiteConfig,
}

impl RailwaySession {
    pub fn new(site: &SiteConfig) -> Result<Self, CheckError> {
        let client = Client::builder()
            .user_agent(&site.user_agent)
            .default_headers(default_headers(site)?)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            site: site.clone(),
        })
    }

    /// GET the search page and pull out the anti-forgery tokens.
    pub async fn fetch_tokens(&self) -> Result<SearchTokens, CheckError> {
        let url = self.site.query_page_url();
        let response = self
            .client
            .get(&url)
            .timeout(self.site.token_timeout)
            .send()
            .await?;
        let html = ensure_success(response, &url)?.text().await?;
        extract_tokens(&html, &url)
    }

    /// POST the assembled form and return the raw results markup.
    pub async fn submit_search(&self, form: &FormFields) -> Result<String, CheckError> {
        let url = self.site.query_train_url();
        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form.encode())
            .timeout(self.site.search_timeout)
            .send()
            .await?;
        Ok(ensure_success(response, &url)?.text().await?)
    }
}

#[async_trait]
impl WindowSearch for RailwaySession {
    async fn search_window(
        &self,
        request: &SearchRequest,
    ) -> Result<AvailabilityReport, CheckError> {
        let tokens = self.fetch_tokens().await?;
        debug!(
            "Fetched tokens for {} {}-{} (csrf present: {}, completeToken present: {})",
            request.ride_date,
            request.start_time,
            request.end_time,
            !tokens.csrf.is_empty(),
            !tokens.complete_token.is_empty()
        );

        let form = build_form(&tokens, request);
        let html = self.submit_search(&form).await?;
        Ok(parse_results(&html))
    }
}

impl SessionFactory for SiteConfig {
    type Session = RailwaySession;

    fn open(&self) -> Result<RailwaySession, CheckError> {
        RailwaySession::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;
    use mockito::{Matcher, Server};

    const QUERY_PATH: &str = "/tra-tip-web/tip/tip001/tip123/query";
    const QUERY_TRAIN_PATH: &str = "/tra-tip-web/tip/tip001/tip123/queryTrain";

    const SEARCH_PAGE: &str = r#"<html><body>
        <form id="queryForm" method="post">
            <input type="hidden" name="_csrf" value="csrf-123"/>
            <input type="text" name="pid"/>
            <input type="hidden" name="completeToken" value="ct-456"/>
        </form>
    </body></html>"#;

    const RESULTS_PAGE: &str = r#"<html><body><table>
        <tr><th>車次</th><th>車種</th><th>出發</th><th>抵達</th></tr>
        <tr><td>152</td><td>自強</td><td>08:00</td><td>10:00</td><td>選擇</td><td>450元</td></tr>
        <tr><td>1234</td><td>區間</td><td>09:10</td><td>11:40</td><td>售完</td></tr>
    </table></body></html>"#;

    #[test]
    fn tokens_from_form() {
        let tokens = extract_tokens(SEARCH_PAGE, "u").unwrap();
        assert_eq!(tokens.csrf, "csrf-123");
        assert_eq!(tokens.complete_token, "ct-456");
    }

    #[test]
    fn missing_inputs_default_to_empty() {
        let html = r#"<form id="queryForm"><input name="_csrf" value="only-csrf"></form>"#;
        let tokens = extract_tokens(html, "u").unwrap();
        assert_eq!(tokens.csrf, "only-csrf");
        assert_eq!(tokens.complete_token, "");

        let html = r#"<form id="queryForm"><input name="_csrf"></form>"#;
        assert_eq!(extract_tokens(html, "u").unwrap(), SearchTokens::default());
    }

    #[test]
    fn missing_form_is_token_not_found() {
        let html = r#"<form id="loginForm"><input name="_csrf" value="x"></form>"#;
        let err = extract_tokens(html, "https://example.test/query").unwrap_err();
        assert!(matches!(err, CheckError::TokenNotFound { ref url } if url == "https://example.test/query"));
    }

    #[test]
    fn inputs_outside_the_form_are_ignored() {
        let html = r#"<input name="_csrf" value="stray"><form id="queryForm"></form>"#;
        assert_eq!(extract_tokens(html, "u").unwrap(), SearchTokens::default());
    }

    #[tokio::test]
    async fn search_window_round_trip_keeps_cookies() {
        let mut server = Server::new_async().await;
        let token_mock = server
            .mock("GET", QUERY_PATH)
            .match_header("accept-language", "zh-TW,zh;q=0.9,en;q=0.8")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_header("set-cookie", "JSESSIONID=abc123; Path=/")
            .with_body(SEARCH_PAGE)
            .create_async()
            .await;
        let search_mock = server
            .mock("POST", QUERY_TRAIN_PATH)
            .match_header("cookie", Matcher::Regex("JSESSIONID=abc123".to_string()))
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("^_csrf=csrf-123&".to_string()),
                Matcher::Regex("&completeToken=ct-456$".to_string()),
                Matcher::Regex("rideDate=2026%2F02%2F21".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(RESULTS_PAGE)
            .create_async()
            .await;

        let site = SiteConfig::new(server.url());
        let session = RailwaySession::new(&site).unwrap();
        let config = sample_config();
        let request = config.search_request("2026/02/21", &config.windows[0]);

        let report = session.search_window(&request).await.unwrap();

        token_mock.assert_async().await;
        search_mock.assert_async().await;
        assert_eq!(report.available.len(), 1);
        assert_eq!(report.available[0].no, "152");
        assert_eq!(report.sold_out.len(), 1);
        assert_eq!(report.sold_out[0].no, "1234");
    }

    fn search_page(csrf: &str, complete_token: &str) -> String {
        format!(
            r#"<form id="queryForm">
                <input type="hidden" name="_csrf" value="{csrf}"/>
                <input type="hidden" name="completeToken" value="{complete_token}"/>
            </form>"#
        )
    }

    #[tokio::test]
    async fn every_window_fetches_its_own_tokens() {
        let mut server = Server::new_async().await;
        let first_page = server
            .mock("GET", QUERY_PATH)
            .with_status(200)
            .with_body(search_page("csrf-one", "ct-one"))
            .expect(1)
            .create_async()
            .await;
        let second_page = server
            .mock("GET", QUERY_PATH)
            .with_status(200)
            .with_body(search_page("csrf-two", "ct-two"))
            .expect(1)
            .create_async()
            .await;
        let morning = server
            .mock("POST", QUERY_TRAIN_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("^_csrf=csrf-one&".to_string()),
                Matcher::Regex("&completeToken=ct-one$".to_string()),
                Matcher::Regex("startTime=06%3A00".to_string()),
            ]))
            .with_status(200)
            .with_body(RESULTS_PAGE)
            .expect(1)
            .create_async()
            .await;
        let afternoon = server
            .mock("POST", QUERY_TRAIN_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("^_csrf=csrf-two&".to_string()),
                Matcher::Regex("&completeToken=ct-two$".to_string()),
                Matcher::Regex("startTime=14%3A00".to_string()),
            ]))
            .with_status(200)
            .with_body(RESULTS_PAGE)
            .expect(1)
            .create_async()
            .await;

        let session = RailwaySession::new(&SiteConfig::new(server.url())).unwrap();
        let config = sample_config();
        assert_eq!(config.windows.len(), 2);
        for window in &config.windows {
            let request = config.search_request("2026/02/21", window);
            let report = session.search_window(&request).await.unwrap();
            assert_eq!(report.available.len(), 1);
        }

        first_page.assert_async().await;
        second_page.assert_async().await;
        morning.assert_async().await;
        afternoon.assert_async().await;
    }

    #[tokio::test]
    async fn page_without_form_fails_the_window() {
        let mut server = Server::new_async().await;
        let _token_mock = server
            .mock("GET", QUERY_PATH)
            .with_status(200)
            .with_body("<html><body>維護中</body></html>")
            .create_async()
            .await;
        let search_mock = server
            .mock("POST", QUERY_TRAIN_PATH)
            .expect(0)
            .create_async()
            .await;

        let session = RailwaySession::new(&SiteConfig::new(server.url())).unwrap();
        let config = sample_config();
        let request = config.search_request("2026/02/21", &config.windows[0]);

        let err = session.search_window(&request).await.unwrap_err();
        assert!(matches!(err, CheckError::TokenNotFound { .. }));
        search_mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_a_network_error() {
        let mut server = Server::new_async().await;
        let _token_mock = server
            .mock("GET", QUERY_PATH)
            .with_status(200)
            .with_body(SEARCH_PAGE)
            .create_async()
            .await;
        let _search_mock = server
            .mock("POST", QUERY_TRAIN_PATH)
            .with_status(503)
            .create_async()
            .await;

        let session = RailwaySession::new(&SiteConfig::new(server.url())).unwrap();
        let form = build_form(&SearchTokens::default(), &{
            let config = sample_config();
            config.search_request("2026/02/21", &config.windows[0])
        });

        let err = session.submit_search(&form).await.unwrap_err();
        assert!(matches!(
            err,
            CheckError::Status { status, .. } if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn unreachable_site_is_a_transport_error() {
        let session = RailwaySession::new(&SiteConfig::new("http://127.0.0.1:9")).unwrap();
        let err = session.fetch_tokens().await.unwrap_err();
        assert!(matches!(err, CheckError::Network(_)));
    }
}
