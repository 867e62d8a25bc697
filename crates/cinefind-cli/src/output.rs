//! Renders browse state as tab-separated log lines.

use cinefind_api::tmdb::{MovieDetail, MovieSummary};
use cinefind_browse::{BrowseState, DetailState, PaginationPhase, TrendingMovie};

/// Number of cast members shown in the detail view.
const CAST_SHOWN: usize = 5;

/// Formats one list row; `index` is the 1-based position used by `:open`.
#[must_use]
pub fn movie_row(index: usize, movie: &MovieSummary) -> String {
    format!(
        "{index}\t{}\t{}\t{}\t{}\t{}",
        movie.id,
        movie.title,
        movie.release_year().unwrap_or("-"),
        movie.rating_label(),
        movie.original_language.to_uppercase(),
    )
}

/// Heading naming what the visible list shows.
#[must_use]
pub fn list_heading(state: &BrowseState) -> String {
    let subject = if state.query.is_empty() {
        String::from("Popular movies")
    } else {
        format!("Results for \"{}\"", state.query)
    };
    if state.total_pages == 0 {
        subject
    } else {
        format!("{subject} (page {}/{})", state.page, state.total_pages)
    }
}

/// Logs the visible list with its loading and error state.
pub fn print_list(state: &BrowseState) {
    if state.is_loading {
        tracing::info!("Loading...");
        return;
    }
    if let Some(message) = &state.error_message {
        tracing::warn!("{message}");
    }
    if state.movies.is_empty() {
        if state.error_message.is_none() {
            tracing::info!("No movies found.");
        }
        return;
    }

    tracing::info!("{}", list_heading(state));
    tracing::info!("#\tID\tTitle\tYear\tRating\tLang");
    for (i, movie) in state.movies.iter().enumerate() {
        tracing::info!("{}", movie_row(i.saturating_add(1), movie));
    }
    if state.is_loading_more {
        tracing::info!("Loading more...");
    } else if state.phase == PaginationPhase::Exhausted && state.error_message.is_none() {
        tracing::info!("End of results.");
    }
}

/// Logs the most searched terms.
pub fn print_trending(trending: &[TrendingMovie]) {
    if trending.is_empty() {
        tracing::info!("No trending searches yet.");
        return;
    }
    tracing::info!("#\tCount\tSearch\tTop movie");
    for (i, entry) in trending.iter().enumerate() {
        tracing::info!(
            "{}\t{}\t{}\t{} ({})",
            i.saturating_add(1),
            entry.count,
            entry.search_term,
            entry.title,
            entry.movie_id,
        );
    }
}

/// Formats the detail lines of one movie.
#[must_use]
pub fn detail_lines(detail: &MovieDetail) -> Vec<String> {
    let summary = &detail.summary;
    let mut lines = vec![format!(
        "{} ({})",
        summary.title,
        summary.release_year().unwrap_or("-")
    )];

    let mut facts = vec![format!("Rating: {}", summary.rating_label())];
    if let Some(runtime) = detail.runtime_label() {
        facts.push(format!("Runtime: {runtime}"));
    }
    facts.push(format!(
        "Language: {}",
        summary.original_language.to_uppercase()
    ));
    lines.push(facts.join("\t"));

    if !detail.genres.is_empty() {
        let genres: Vec<&str> = detail.genres.iter().map(|g| g.name.as_str()).collect();
        lines.push(format!("Genres: {}", genres.join(", ")));
    }
    if let Some(overview) = detail.overview.as_deref().filter(|o| !o.is_empty()) {
        lines.push(overview.to_owned());
    }
    if !detail.credits.cast.is_empty() {
        let cast: Vec<String> = detail
            .credits
            .cast
            .iter()
            .take(CAST_SHOWN)
            .map(|member| match member.character.as_deref() {
                Some(character) if !character.is_empty() => {
                    format!("{} as {character}", member.name)
                }
                _ => member.name.clone(),
            })
            .collect();
        lines.push(format!("Cast: {}", cast.join(", ")));
    }
    if let Some(trailer) = detail.trailer() {
        if trailer.site == "YouTube" {
            lines.push(format!(
                "Trailer: https://www.youtube.com/watch?v={}",
                trailer.key
            ));
        } else {
            lines.push(format!("Trailer: {} ({})", trailer.name, trailer.site));
        }
    }
    lines
}

/// Logs the detail modal state.
pub fn print_detail(state: &DetailState) {
    if state.loading {
        tracing::info!("Loading details...");
        return;
    }
    if let Some(error) = &state.error {
        tracing::warn!("{error}");
        return;
    }
    if let Some(detail) = &state.detail {
        for line in detail_lines(detail) {
            tracing::info!("{line}");
        }
    }
}
