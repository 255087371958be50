use std::sync::Arc;

use askama::Template;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::db::{Database, Module, Video};
use crate::news::{Category, NewsClient, NewsError};
use crate::view::{format_date, Notification, NewsView, ViewState, FALLBACK_IMAGE, PLACEHOLDER_CARDS};

pub struct AppState {
    pub db: Arc<Database>,
    pub news: Arc<NewsClient>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let proxy = Router::new()
        .route("/functions/fetch-finance-news", post(fetch_finance_news))
        .layer(cors_layer());

    Router::new()
        .route("/", get(home))
        .route("/learn", get(learn))
        .route("/module/:id", get(module))
        .route("/news", get(news))
        .route("/news/articles", get(news_articles))
        .route("/health", get(health))
        .merge(proxy)
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

// Template structs
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub features: &'static [Feature],
}

pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

const FEATURES: &[Feature] = &[
    Feature {
        title: "Systematic Investment Plans",
        description: "Learn how to build wealth through disciplined, regular investments",
    },
    Feature {
        title: "Stock Trading",
        description: "Master the fundamentals of market analysis and trading strategies",
    },
    Feature {
        title: "Personal Finance",
        description: "Take control of your budget, savings, and financial future",
    },
];

#[derive(Template)]
#[template(path = "learn.html")]
pub struct LearnTemplate {
    pub modules: Vec<ModuleWithCount>,
}

pub struct ModuleWithCount {
    pub module: Module,
    pub video_count: i64,
}

#[derive(Template)]
#[template(path = "module.html")]
pub struct ModuleTemplate {
    pub module: Module,
    pub videos: Vec<Video>,
}

pub struct Tab {
    pub id: &'static str,
    pub label: &'static str,
    pub active: bool,
}

pub struct ArticleCard {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: Option<String>,
    pub source: String,
    pub published: String,
}

#[derive(Template)]
#[template(path = "news.html")]
pub struct NewsPageTemplate {
    pub tabs: Vec<Tab>,
    pub results: NewsResultsTemplate,
}

#[derive(Template)]
#[template(path = "news_results.html")]
pub struct NewsResultsTemplate {
    pub category: &'static str,
    pub state: ViewState,
    pub placeholders: usize,
    pub articles: Vec<ArticleCard>,
    pub notifications: Vec<Notification>,
    pub fallback_image: &'static str,
}

impl NewsResultsTemplate {
    fn from_view(view: &NewsView) -> Self {
        let articles = view
            .articles()
            .iter()
            .map(|article| ArticleCard {
                title: article.title.clone(),
                description: article.description.clone().unwrap_or_default(),
                url: article.url.clone(),
                image: article.url_to_image.clone().filter(|src| !src.is_empty()),
                source: article.source.name.clone(),
                published: format_date(&article.published_at),
            })
            .collect();

        Self {
            category: view.selected().id(),
            state: view.state(),
            placeholders: PLACEHOLDER_CARDS,
            articles,
            notifications: view.notifications().to_vec(),
            fallback_image: FALLBACK_IMAGE,
        }
    }
}

impl NewsPageTemplate {
    fn from_view(view: &NewsView) -> Self {
        let tabs = Category::ALL
            .into_iter()
            .map(|category| Tab {
                id: category.id(),
                label: category.label(),
                active: category == view.selected(),
            })
            .collect();

        Self {
            tabs,
            results: NewsResultsTemplate::from_view(view),
        }
    }
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type for HTML pages
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

/// Error payload for the news proxy. Every failure becomes a 500 with
/// `{ "error": "<message>" }`.
pub struct ProxyError(NewsError);

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error!("News proxy failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

impl<E: Into<NewsError>> From<E> for ProxyError {
    fn from(err: E) -> Self {
        ProxyError(err.into())
    }
}

// Route handlers
pub async fn home() -> impl IntoResponse {
    HtmlTemplate(HomeTemplate { features: FEATURES })
}

pub async fn learn(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let modules = state.db.get_all_modules().await?;

    let mut with_counts = Vec::with_capacity(modules.len());
    for module in modules {
        let video_count = state.db.get_video_count_for_module(&module.id).await?;
        with_counts.push(ModuleWithCount {
            module,
            video_count,
        });
    }

    Ok(HtmlTemplate(LearnTemplate {
        modules: with_counts,
    }))
}

pub async fn module(
    State(state): State<Arc<AppState>>,
    Path(module_id): Path<String>,
) -> Result<Response, AppError> {
    let Some(module) = state.db.get_module(&module_id).await? else {
        return Ok((StatusCode::NOT_FOUND, Html("Module not found")).into_response());
    };

    let videos = state.db.get_videos_for_module(&module.id).await?;

    Ok(HtmlTemplate(ModuleTemplate { module, videos }).into_response())
}

#[derive(Deserialize)]
pub struct NewsQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// News page shell. The article grid is loaded separately from
/// `/news/articles`, so this only renders the skeleton (or the
/// missing-credential card, in which case nothing will be fetched).
pub async fn news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> impl IntoResponse {
    let category = Category::resolve(query.category.as_deref());
    let mut view = NewsView::new(category);
    // The fetch itself happens in `news_articles`, requested by the skeleton
    view.select(category, state.news.has_credential());

    HtmlTemplate(NewsPageTemplate::from_view(&view))
}

pub async fn news_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> impl IntoResponse {
    let category = Category::resolve(query.category.as_deref());
    let mut view = NewsView::new(category);
    view.load(&state.news, category).await;

    HtmlTemplate(NewsResultsTemplate::from_view(&view))
}

#[derive(Deserialize)]
pub struct ProxyRequest {
    #[serde(default)]
    pub category: Option<serde_json::Value>,
}

/// Forward a category to the news provider and relay its JSON body untouched.
pub async fn fetch_finance_news(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let request: ProxyRequest = serde_json::from_slice(&body)?;
    let category = Category::resolve(
        request
            .category
            .as_ref()
            .and_then(serde_json::Value::as_str),
    );

    let payload = state.news.fetch_raw(category).await?;
    serde_json::from_slice::<IgnoredAny>(&payload)?;

    Ok(([(header::CONTENT_TYPE, "application/json")], payload).into_response())
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
