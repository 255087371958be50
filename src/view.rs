//! News page state machine.
//!
//! A `NewsView` tracks the selected category, the current display state and
//! the articles from the latest completed fetch. Every selection hands out a
//! `FetchTicket`; results carrying an outdated ticket are dropped so a slow
//! response can never overwrite a newer one.

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::news::{Article, Category, NewsClient, NewsError, NewsResponse};

/// Skeleton cards shown while a fetch is in flight
pub const PLACEHOLDER_CARDS: usize = 6;

/// Image shown in place of an article image that fails to load
pub const FALLBACK_IMAGE: &str = "/static/placeholder.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Loaded,
    Empty,
    Error,
    MissingCredential,
}

/// A transient, user-visible message (rendered as a toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: &'static str,
    pub description: &'static str,
}

impl Notification {
    pub const MISSING_CREDENTIAL: Notification = Notification {
        title: "API Key Missing",
        description: "Unable to load news. The server has no NEWS_API_KEY configured.",
    };

    pub const FETCH_FAILED: Notification = Notification {
        title: "Error Loading News",
        description: "Unable to fetch the latest news. Please try again later.",
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub category: Category,
}

#[derive(Debug)]
pub struct NewsView {
    selected: Category,
    state: ViewState,
    articles: Vec<Article>,
    generation: u64,
    notifications: Vec<Notification>,
}

impl NewsView {
    pub fn new(category: Category) -> Self {
        Self {
            selected: category,
            state: ViewState::Loading,
            articles: Vec::new(),
            generation: 0,
            notifications: Vec::new(),
        }
    }

    pub fn selected(&self) -> Category {
        self.selected
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && ticket.category == self.selected
    }

    /// Select a category. Returns the ticket for the fetch that should follow,
    /// or `None` when no credential is configured and nothing may be fetched.
    pub fn select(&mut self, category: Category, credential_present: bool) -> Option<FetchTicket> {
        self.selected = category;
        self.generation += 1;

        if !credential_present {
            warn!(%category, "News credential missing, not fetching");
            self.state = ViewState::MissingCredential;
            self.articles.clear();
            self.notifications.push(Notification::MISSING_CREDENTIAL);
            return None;
        }

        self.state = ViewState::Loading;
        Some(FetchTicket {
            generation: self.generation,
            category,
        })
    }

    /// Apply a finished fetch. Returns `false` if the ticket was stale and the
    /// result was discarded.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<NewsResponse, NewsError>,
    ) -> bool {
        if !self.is_current(&ticket) {
            debug!(
                category = %ticket.category,
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale news result"
            );
            return false;
        }

        match result {
            Ok(response) if response.is_ok() => {
                self.articles = response.articles;
                self.state = if self.articles.is_empty() {
                    ViewState::Empty
                } else {
                    ViewState::Loaded
                };
            }
            Ok(response) => {
                error!(category = %ticket.category, status = %response.status, "News provider rejected request");
                self.fail();
            }
            Err(e) => {
                error!(category = %ticket.category, "Error fetching news: {}", e);
                self.fail();
            }
        }

        true
    }

    /// Select `category`, fetch it through `client` and apply the result.
    pub async fn load(&mut self, client: &NewsClient, category: Category) -> ViewState {
        if let Some(ticket) = self.select(category, client.has_credential()) {
            let result = client.fetch(ticket.category).await;
            self.complete(ticket, result);
        }
        self.state
    }

    fn fail(&mut self) {
        self.state = ViewState::Error;
        self.articles.clear();
        self.notifications.push(Notification::FETCH_FAILED);
    }
}

/// Format a provider timestamp as e.g. `Mar 5, 2024`; unparseable input is
/// returned as-is.
pub fn format_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
