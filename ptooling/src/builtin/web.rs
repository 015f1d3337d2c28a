//! `get_weather` and `web_search`, both plain HTTP GETs behind [`WebTransport`].

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use serde_json::{Value, json};

use crate::{
    ToolArgs, ToolCatalog, ToolError, ToolFuture, object_definition, optional_bool,
    optional_number, required_string,
};

pub const WEATHER_BASE_URL: &str = "https://wttr.in/";
pub const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
/// Applies to each request separately.
pub const WEB_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SEARCH_RESULTS: usize = 5;
const MAX_SEARCH_RESULTS: usize = 10;
/// Fetched pages are cut to this many characters before reaching the model.
pub const MAX_PAGE_CHARS: usize = 4000;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

static ANCHOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<a\s([^>]*)>(.*?)</a>").ok());
static HREF: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*"([^"]*)""#).ok());
static NOFOLLOW: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)\brel\s*=\s*"nofollow""#).ok());
static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").ok());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPage {
    pub status: u16,
    pub body: String,
}

impl WebPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait WebTransport: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> ToolFuture<'a, Result<WebPage, ToolError>>;
}

/// `reqwest` client with a browser user agent and [`WEB_REQUEST_TIMEOUT`].
#[derive(Debug, Clone)]
pub struct HttpWebTransport {
    client: reqwest::Client,
}

impl HttpWebTransport {
    pub fn new() -> Result<Self, ToolError> {
        reqwest::Client::builder()
            .timeout(WEB_REQUEST_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map(|client| Self { client })
            .map_err(|err| ToolError::other(format!("could not build http client: {err}")))
    }
}

impl WebTransport for HttpWebTransport {
    fn get<'a>(&'a self, url: &'a str) -> ToolFuture<'a, Result<WebPage, ToolError>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await.map_err(request_error)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(request_error)?;
            Ok(WebPage { status, body })
        })
    }
}

fn request_error(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        ToolError::timeout(format!("request timed out: {err}"))
    } else {
        ToolError::execution(format!("request failed: {err}"))
    }
}

pub(super) fn register(catalog: &mut ToolCatalog, transport: Arc<dyn WebTransport>) {
    let weather_transport = Arc::clone(&transport);
    catalog.register_fn(
        object_definition(
            "get_weather",
            "Get the current weather for a location.",
            json!({
                "location": {"type": "string", "description": "Location name, e.g. \"Budapest\""}
            }),
            &["location"],
        ),
        move |args, _context| {
            let transport = Arc::clone(&weather_transport);
            async move { get_weather(transport.as_ref(), args).await }
        },
    );

    catalog.register_fn(
        object_definition(
            "web_search",
            "Search the web and return the top results with their titles and URLs.",
            json!({
                "query": {"type": "string", "description": "The search query"},
                "num_results": {"type": "integer", "description": "How many results to return (default 5, at most 10)"},
                "fetch_content": {"type": "boolean", "description": "Also download each result page (default false)"}
            }),
            &["query"],
        ),
        move |args, _context| {
            let transport = Arc::clone(&transport);
            async move { web_search(transport.as_ref(), args).await }
        },
    );
}

pub async fn get_weather(transport: &dyn WebTransport, args: ToolArgs) -> Result<Value, ToolError> {
    let location = required_string(&args, "location")?;
    let location = location.trim();
    if location.is_empty() {
        return Err(ToolError::invalid_arguments("location must not be empty"));
    }

    let url = weather_url(location)?;
    let page = transport.get(url.as_str()).await?;
    if !page.is_success() {
        return Err(ToolError::execution(format!(
            "failed to fetch weather for {location} (HTTP {})",
            page.status
        )));
    }

    let report = serde_json::from_str::<Value>(&page.body)
        .map_err(|err| ToolError::execution(format!("unreadable weather report: {err}")))?;
    let current = &report["current_condition"][0];
    let temperature = text_field(current, "temp_C")
        .and_then(|value| value.parse::<f64>().ok())
        .ok_or_else(|| missing_weather_field("temp_C"))?;
    let condition = current["weatherDesc"][0]["value"]
        .as_str()
        .ok_or_else(|| missing_weather_field("weatherDesc"))?;
    let humidity = text_field(current, "humidity")
        .and_then(|value| value.parse::<u32>().ok())
        .ok_or_else(|| missing_weather_field("humidity"))?;

    Ok(json!({
        "location": location,
        "temperature_celsius": temperature,
        "condition": condition,
        "humidity_percent": humidity,
    }))
}

fn weather_url(location: &str) -> Result<Url, ToolError> {
    let mut url = Url::parse(WEATHER_BASE_URL)
        .map_err(|err| ToolError::other(format!("bad weather endpoint: {err}")))?;
    url.path_segments_mut()
        .map_err(|()| ToolError::other("weather endpoint cannot take a path"))?
        .pop_if_empty()
        .push(location);
    url.query_pairs_mut().append_pair("format", "j1");
    Ok(url)
}

/// wttr.in sends numbers as strings, but accept either.
fn text_field(value: &Value, key: &str) -> Option<String> {
    match &value[key] {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn missing_weather_field(field: &str) -> ToolError {
    ToolError::execution(format!("weather report is missing '{field}'"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl SearchResult {
    fn to_json(&self) -> Value {
        json!({
            "title": self.title,
            "url": self.url,
            "snippet": "",
            "content": self.content,
        })
    }
}

/// A failed search yields an empty list; a failed page fetch leaves its content empty.
pub async fn web_search(transport: &dyn WebTransport, args: ToolArgs) -> Result<Value, ToolError> {
    let query = required_string(&args, "query")?;
    if query.trim().is_empty() {
        return Err(ToolError::invalid_arguments("query must not be empty"));
    }
    let limit = optional_number(&args, "num_results")?
        .map(|count| count.clamp(1.0, MAX_SEARCH_RESULTS as f64) as usize)
        .unwrap_or(DEFAULT_SEARCH_RESULTS);
    let fetch_content = optional_bool(&args, "fetch_content")?.unwrap_or(false);

    let url = Url::parse_with_params(SEARCH_URL, &[("q", query.trim())])
        .map_err(|err| ToolError::other(format!("bad search endpoint: {err}")))?;
    let page = match transport.get(url.as_str()).await {
        Ok(page) if page.is_success() => page,
        Ok(page) => {
            tracing::warn!(status = page.status, "web search was refused");
            return Ok(json!([]));
        }
        Err(error) => {
            tracing::warn!(error = %error, "web search failed");
            return Ok(json!([]));
        }
    };

    let mut results = parse_search_results(&page.body, limit);
    if fetch_content {
        for result in &mut results {
            result.content = match transport.get(&result.url).await {
                Ok(page) if page.is_success() => page.body.chars().take(MAX_PAGE_CHARS).collect(),
                Ok(page) => {
                    tracing::debug!(url = %result.url, status = page.status, "result page refused");
                    String::new()
                }
                Err(error) => {
                    tracing::debug!(url = %result.url, error = %error, "result page unreachable");
                    String::new()
                }
            };
        }
    }

    Ok(Value::Array(results.iter().map(SearchResult::to_json).collect()))
}

/// Reads result links (`rel="nofollow"` anchors) from DuckDuckGo's HTML page.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SearchResult> {
    let (Some(anchor), Some(href), Some(nofollow)) =
        (ANCHOR.as_ref(), HREF.as_ref(), NOFOLLOW.as_ref())
    else {
        return Vec::new();
    };

    anchor
        .captures_iter(html)
        .filter(|link| nofollow.is_match(&link[1]))
        .filter_map(|link| {
            let target = href.captures(&link[1])?.get(1)?.as_str().trim().to_string();
            let title = visible_text(&link[2]);
            (!target.is_empty() && !title.is_empty()).then(|| SearchResult {
                title,
                url: resolve_result_url(&decode_entities(&target)),
                content: String::new(),
            })
        })
        .take(limit)
        .collect()
}

/// Unwraps DuckDuckGo's `/l/?uddg=` redirect and makes protocol-relative links absolute.
pub fn resolve_result_url(href: &str) -> String {
    let absolute = match href.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => href.to_string(),
    };
    let Ok(url) = Url::parse(&absolute) else {
        return absolute;
    };

    let is_redirect = url
        .host_str()
        .is_some_and(|host| host.ends_with("duckduckgo.com"))
        && url.path().starts_with("/l/");
    if is_redirect
        && let Some((_, target)) = url.query_pairs().find(|(key, _)| key == "uddg")
    {
        return target.into_owned();
    }
    absolute
}

fn visible_text(fragment: &str) -> String {
    let stripped = match TAG.as_ref() {
        Some(tag) => tag.replace_all(fragment, ""),
        None => fragment.into(),
    };
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::ToolErrorKind;

    #[derive(Default)]
    struct ScriptedWeb {
        replies: Mutex<VecDeque<Result<WebPage, ToolError>>>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedWeb {
        fn replying(replies: Vec<Result<WebPage, ToolError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().expect("requested lock").clone()
        }
    }

    impl WebTransport for ScriptedWeb {
        fn get<'a>(&'a self, url: &'a str) -> ToolFuture<'a, Result<WebPage, ToolError>> {
            Box::pin(async move {
                self.requested.lock().expect("requested lock").push(url.to_string());
                self.replies
                    .lock()
                    .expect("replies lock")
                    .pop_front()
                    .unwrap_or_else(|| Err(ToolError::execution("no scripted reply left")))
            })
        }
    }

    fn ok(body: &str) -> Result<WebPage, ToolError> {
        Ok(WebPage {
            status: 200,
            body: body.to_string(),
        })
    }

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().expect("object arguments")
    }

    const RESULTS_PAGE: &str = r#"
        <a class="result__a" rel="nofollow" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F&amp;rut=abc">The <b>Rust</b> Book</a>
        <a href="/settings">Settings</a>
        <a rel="nofollow" class="result__a" href="https://tokio.rs/">Tokio &amp; async</a>
        <a rel="nofollow" href="https://example.com/">   </a>
        <a rel="nofollow" href="https://crates.io/">crates.io</a>
    "#;

    #[tokio::test]
    async fn weather_report_is_reduced_to_the_basics() {
        let web = ScriptedWeb::replying(vec![ok(r#"{
            "current_condition": [{
                "temp_C": "21",
                "humidity": "40",
                "weatherDesc": [{"value": "Partly cloudy"}]
            }]
        }"#)]);

        let report = get_weather(&web, args(json!({"location": "New York"})))
            .await
            .expect("report");

        assert_eq!(
            report,
            json!({
                "location": "New York",
                "temperature_celsius": 21.0,
                "condition": "Partly cloudy",
                "humidity_percent": 40
            })
        );
        assert_eq!(web.requested(), vec!["https://wttr.in/New%20York?format=j1"]);
    }

    #[tokio::test]
    async fn weather_failures_name_the_location() {
        let web = ScriptedWeb::replying(vec![Ok(WebPage {
            status: 404,
            body: String::new(),
        })]);

        let error = get_weather(&web, args(json!({"location": "Atlantis"})))
            .await
            .expect_err("unknown location");

        assert_eq!(error.kind, ToolErrorKind::Execution);
        assert!(error.message.contains("Atlantis"));

        let web = ScriptedWeb::replying(vec![ok(r#"{"current_condition": []}"#)]);
        let error = get_weather(&web, args(json!({"location": "Budapest"})))
            .await
            .expect_err("empty report");
        assert!(error.message.contains("temp_C"));
    }

    #[test]
    fn only_nofollow_links_with_titles_are_results() {
        let results = parse_search_results(RESULTS_PAGE, 10);

        assert_eq!(
            results
                .iter()
                .map(|result| (result.title.as_str(), result.url.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("The Rust Book", "https://doc.rust-lang.org/book/"),
                ("Tokio & async", "https://tokio.rs/"),
                ("crates.io", "https://crates.io/"),
            ]
        );
        assert_eq!(parse_search_results(RESULTS_PAGE, 1).len(), 1);
        assert!(parse_search_results("<html></html>", 5).is_empty());
    }

    #[test]
    fn non_redirect_links_are_kept() {
        assert_eq!(resolve_result_url("//example.com/a"), "https://example.com/a");
        assert_eq!(resolve_result_url("https://example.com/"), "https://example.com/");
        assert_eq!(resolve_result_url("not a url"), "not a url");
    }

    #[tokio::test]
    async fn search_without_content_makes_one_request() {
        let web = ScriptedWeb::replying(vec![ok(RESULTS_PAGE)]);

        let results = web_search(&web, args(json!({"query": "rust async", "num_results": "2"})))
            .await
            .expect("results");

        assert_eq!(results.as_array().map(Vec::len), Some(2));
        assert_eq!(results[1]["content"], json!(""));
        assert_eq!(
            web.requested(),
            vec!["https://html.duckduckgo.com/html/?q=rust+async"]
        );
    }

    #[tokio::test]
    async fn fetched_pages_fill_content_and_failures_leave_it_empty() {
        let long_page = "x".repeat(MAX_PAGE_CHARS + 10);
        let web = ScriptedWeb::replying(vec![
            ok(RESULTS_PAGE),
            ok(&long_page),
            Err(ToolError::timeout("slow site")),
        ]);

        let results = web_search(
            &web,
            args(json!({"query": "rust", "num_results": 2, "fetch_content": true})),
        )
        .await
        .expect("results");

        assert_eq!(
            results[0]["content"].as_str().map(str::len),
            Some(MAX_PAGE_CHARS)
        );
        assert_eq!(results[1]["content"], json!(""));
        assert_eq!(web.requested()[2], "https://tokio.rs/");
    }

    #[tokio::test]
    async fn unreachable_search_returns_no_results() {
        let web = ScriptedWeb::replying(vec![Err(ToolError::timeout("no network"))]);

        let results = web_search(&web, args(json!({"query": "rust"})))
            .await
            .expect("search failures are not tool errors");

        assert_eq!(results, json!([]));
    }
}
