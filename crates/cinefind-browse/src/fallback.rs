//! Movies shown when the catalog does not answer in time.

use cinefind_api::tmdb::MovieSummary;

/// Fixed set of well-known titles.
#[must_use]
pub fn fallback_movies() -> Vec<MovieSummary> {
    [
        (278, "The Shawshank Redemption", 8.7, "1994-09-23"),
        (238, "The Godfather", 8.7, "1972-03-14"),
        (155, "The Dark Knight", 8.5, "2008-07-16"),
    ]
    .into_iter()
    .map(|(id, title, vote_average, release_date)| MovieSummary {
        id,
        title: String::from(title),
        vote_average: Some(vote_average),
        poster_path: None,
        release_date: Some(String::from(release_date)),
        original_language: String::from("en"),
    })
    .collect()
}
