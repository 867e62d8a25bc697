//! Interactive browsing over stdin.
//!
//! Every plain line replaces the search text and goes through the
//! debouncer; lines starting with `:` are commands. Fetches and detail loads
//! run as local tasks so input keeps flowing while they are in flight.
#![allow(clippy::future_not_send)]

use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use cinefind_api::tmdb::{CatalogClient, MovieSummary};
use cinefind_browse::{
    BrowseConfig, DetailView, FetchMode, FetchOutcome, ListController, SearchQuery,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinHandle, LocalSet};
use tracing::{instrument, warn};

use crate::analytics::SqliteAnalytics;
use crate::output;

type Controller = ListController<CatalogClient, SqliteAnalytics>;

/// Help line shown when the loop starts.
const HELP: &str = "Type to search. Commands: :more, :open N, :close, :trending, :quit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum WatchInput {
    /// New search text (may be empty to go back to popular movies).
    Query(String),
    /// Load the next page.
    More,
    /// Open the details of the movie at a 1-based list position.
    Open(usize),
    /// Close the detail view.
    Close,
    /// Reload the trending searches.
    Trending,
    /// Leave the loop.
    Quit,
    /// A command that is not recognized.
    Unknown(String),
}

impl WatchInput {
    /// Classifies one input line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let Some(command) = line.trim().strip_prefix(':') else {
            return Self::Query(line.to_owned());
        };
        let mut words = command.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some("more" | "m"), None, None) => Self::More,
            (Some("open" | "o"), Some(n), None) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::Open(n),
                _ => Self::Unknown(command.to_owned()),
            },
            (Some("close" | "c"), None, None) => Self::Close,
            (Some("trending" | "t"), None, None) => Self::Trending,
            (Some("quit" | "q"), None, None) => Self::Quit,
            _ => Self::Unknown(command.to_owned()),
        }
    }
}

/// Runs the interactive loop until `:quit` or end of input.
///
/// At end of input the last typed query is still searched and every
/// running load is awaited.
///
/// # Errors
///
/// Returns an error if a client cannot be built or stdin cannot be read.
#[instrument(skip_all)]
#[allow(clippy::module_name_repetitions)]
pub async fn run_watch(browse: BrowseConfig, analytics: Arc<SqliteAnalytics>) -> Result<()> {
    LocalSet::new()
        .run_until(watch_loop(browse, analytics))
        .await
}

async fn watch_loop(browse: BrowseConfig, analytics: Arc<SqliteAnalytics>) -> Result<()> {
    let controller = Rc::new(browse.list_controller(analytics)?);
    let detail = Rc::new(browse.detail_view()?);
    let debouncer = browse.debouncer();
    let mut searches = debouncer.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    controller.load_trending().await;
    output::print_trending(&controller.snapshot().await.trending);
    tracing::info!("{HELP}");

    let mut dispatched = SearchQuery::default();
    tasks.push(spawn_fetch(&controller, dispatched.clone()));

    let end_of_input = loop {
        tasks.retain(|task| !task.is_finished());
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break true;
                };
                match WatchInput::parse(&line) {
                    WatchInput::Query(text) => debouncer.push(SearchQuery::new(text)),
                    WatchInput::More => tasks.push(spawn_more(&controller)),
                    WatchInput::Open(position) => {
                        match movie_at(&controller, position).await {
                            Some(movie) => tasks.push(spawn_detail(&detail, movie)),
                            None => warn!("No movie at position {position}"),
                        }
                    }
                    WatchInput::Close => detail.close().await,
                    WatchInput::Trending => {
                        controller.load_trending().await;
                        output::print_trending(&controller.snapshot().await.trending);
                    }
                    WatchInput::Quit => break false,
                    WatchInput::Unknown(command) => warn!("Unknown command: {command}"),
                }
            }
            changed = searches.changed() => {
                if changed.is_err() {
                    break true;
                }
                let query = searches.borrow_and_update().clone();
                dispatched = query.clone();
                tasks.push(spawn_fetch(&controller, query));
            }
        }
    };

    let last = debouncer.finish().await;
    if end_of_input && last != dispatched {
        tasks.push(spawn_fetch(&controller, last));
    }
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "browse task failed");
        }
    }
    controller.drain_reports().await;
    Ok(())
}

async fn movie_at(controller: &Controller, position: usize) -> Option<MovieSummary> {
    let index = position.checked_sub(1)?;
    controller.snapshot().await.movies.get(index).cloned()
}

async fn show_outcome(controller: &Controller, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Discarded | FetchOutcome::Ignored => {}
        FetchOutcome::Served | FetchOutcome::Committed | FetchOutcome::Failed(_) => {
            output::print_list(&controller.snapshot().await);
        }
    }
}

fn spawn_fetch(controller: &Rc<Controller>, query: SearchQuery) -> JoinHandle<()> {
    let controller = Rc::clone(controller);
    tokio::task::spawn_local(async move {
        let outcome = controller.fetch(query, 1, FetchMode::Replace).await;
        show_outcome(&controller, &outcome).await;
    })
}

fn spawn_more(controller: &Rc<Controller>) -> JoinHandle<()> {
    let controller = Rc::clone(controller);
    tokio::task::spawn_local(async move {
        let outcome = controller.on_sentinel_visible().await;
        if outcome == FetchOutcome::Ignored {
            tracing::info!("Nothing more to load.");
        }
        show_outcome(&controller, &outcome).await;
    })
}

fn spawn_detail(detail: &Rc<DetailView<CatalogClient>>, movie: MovieSummary) -> JoinHandle<()> {
    let detail = Rc::clone(detail);
    tokio::task::spawn_local(async move {
        if detail.open(movie).await {
            output::print_detail(&detail.snapshot().await);
        }
    })
}
