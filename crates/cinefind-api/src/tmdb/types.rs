//! TMDB API response types and search parameters.

use serde::{Deserialize, Deserializer, Serialize};

/// Reads a string field where TMDB uses `""` for "unknown".
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

// --- Movie lists ---

/// One page of movies from `discover/movie` or `search/movie`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    /// Current page number.
    pub page: u32,
    /// Movies on this page, in upstream order.
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    /// Total number of pages for this query.
    pub total_pages: u32,
    /// Total number of results for this query.
    #[serde(default)]
    pub total_results: u32,
}

/// A movie as listed in search/discover results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Average rating (0-10).
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub release_date: Option<String>,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: String,
}

impl MovieSummary {
    /// Returns the year part of the release date, if any.
    #[must_use]
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .filter(|year| !year.is_empty())
    }

    /// Formats the rating with one decimal, or `"N/A"` when unrated.
    #[must_use]
    pub fn rating_label(&self) -> String {
        match self.vote_average {
            Some(avg) if avg > 0.0 => format!("{avg:.1}"),
            _ => String::from("N/A"),
        }
    }
}

// --- Movie details ---

/// Response from `movie/{id}?append_to_response=credits,videos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    /// Summary fields shared with list results.
    #[serde(flatten)]
    pub summary: MovieSummary,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Appended `credits` sub-resource.
    #[serde(default)]
    pub credits: Credits,
    /// Appended `videos` sub-resource.
    #[serde(default)]
    pub videos: Videos,
}

impl MovieDetail {
    /// Picks the trailer to show: the first YouTube trailer, otherwise the
    /// first video of any kind.
    #[must_use]
    pub fn trailer(&self) -> Option<&Video> {
        self.videos
            .results
            .iter()
            .find(|v| v.site == "YouTube" && v.kind == "Trailer")
            .or_else(|| self.videos.results.first())
    }

    /// Formats the runtime as `"2h 32m"`.
    #[must_use]
    pub fn runtime_label(&self) -> Option<String> {
        self.runtime
            .filter(|minutes| *minutes > 0)
            .map(|minutes| format!("{}h {}m", minutes / 60, minutes % 60))
    }
}

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// `credits` sub-resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credits {
    /// Cast in billing order.
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

/// A person in the cast list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    /// TMDB person ID.
    pub id: u64,
    /// Person name.
    pub name: String,
    /// Character played.
    #[serde(default)]
    pub character: Option<String>,
    /// Profile photo path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// `videos` sub-resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Videos {
    /// Videos attached to the movie.
    #[serde(default)]
    pub results: Vec<Video>,
}

/// A video (trailer, teaser, clip) hosted on an external site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Site-specific video key (e.g. the YouTube ID).
    pub key: String,
    /// Video title.
    #[serde(default)]
    pub name: String,
    /// Hosting site (e.g. "YouTube").
    #[serde(default)]
    pub site: String,
    /// Video type (e.g. "Trailer", "Teaser").
    #[serde(rename = "type", default)]
    pub kind: String,
}

// --- Error bodies ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
}

/// Error body produced by the cinefind proxy.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProxyErrorResponse {
    /// Error message.
    pub error: String,
}

// --- Search Parameters ---

/// Parameters for `search/movie` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMovieParams {
    /// Search query (required).
    pub query: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Response language; upstream default when `None`.
    pub language: Option<String>,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            language: None,
            include_adult: false,
        }
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    fn summary(vote_average: Option<f64>, release_date: Option<&str>) -> MovieSummary {
        MovieSummary {
            id: 1,
            title: String::from("Test"),
            vote_average,
            poster_path: None,
            release_date: release_date.map(String::from),
            original_language: String::from("en"),
        }
    }

    #[test]
    fn test_empty_release_date_is_none() {
        // Arrange
        let json = r#"{"id":1,"title":"Untitled","release_date":"","original_language":"en"}"#;

        // Act
        let movie: MovieSummary = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(movie.release_date, None);
        assert_eq!(movie.release_year(), None);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        // Arrange
        let json = r#"{"id":7,"title":"Bare"}"#;

        // Act
        let movie: MovieSummary = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(movie.vote_average, None);
        assert_eq!(movie.poster_path, None);
        assert!(movie.original_language.is_empty());
    }

    #[test]
    fn test_release_year() {
        // Arrange
        let movie = summary(None, Some("2008-07-16"));

        // Act & Assert
        assert_eq!(movie.release_year(), Some("2008"));
    }

    #[test]
    fn test_rating_label() {
        // Arrange & Act & Assert
        assert_eq!(summary(Some(8.512), None).rating_label(), "8.5");
        assert_eq!(summary(Some(0.0), None).rating_label(), "N/A");
        assert_eq!(summary(None, None).rating_label(), "N/A");
    }

    #[test]
    fn test_trailer_prefers_youtube_trailer() {
        // Arrange
        let json = r#"{
            "id": 155, "title": "The Dark Knight",
            "videos": {"results": [
                {"key": "teaser1", "name": "Teaser", "site": "YouTube", "type": "Teaser"},
                {"key": "trailer1", "name": "Official Trailer", "site": "YouTube", "type": "Trailer"}
            ]}
        }"#;

        // Act
        let detail: MovieDetail = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(detail.trailer().unwrap().key, "trailer1");
    }

    #[test]
    fn test_trailer_falls_back_to_first_video() {
        // Arrange
        let json = r#"{
            "id": 1, "title": "Clip Only",
            "videos": {"results": [{"key": "clip", "name": "Clip", "site": "Vimeo", "type": "Clip"}]}
        }"#;

        // Act
        let detail: MovieDetail = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(detail.trailer().unwrap().key, "clip");
    }

    #[test]
    fn test_detail_without_sub_resources() {
        // Arrange
        let json = r#"{"id": 2, "title": "No Extras", "runtime": 152}"#;

        // Act
        let detail: MovieDetail = serde_json::from_str(json).unwrap();

        // Assert
        assert!(detail.trailer().is_none());
        assert!(detail.credits.cast.is_empty());
        assert_eq!(detail.runtime_label().as_deref(), Some("2h 32m"));
    }

    #[test]
    fn test_search_params_builder() {
        // Arrange & Act
        let params = SearchMovieParams::new("batman").page(3).language("en-US");

        // Assert
        assert_eq!(params.page, 3);
        assert_eq!(params.language.as_deref(), Some("en-US"));
        assert!(!params.include_adult);
    }
}
