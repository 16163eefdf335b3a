use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::MovieId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(alias = "_id")]
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub release_year: Option<u32>,
    #[serde(default)]
    pub genre: BTreeSet<String>,
    #[serde(default)]
    pub average_rating: f32, // 0-5, computed server-side
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(default)]
    pub duration: Option<u32>, // Minutes
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
}

impl Movie {
    /// Minimal movie record, mostly useful for tests and placeholders
    pub fn new(id: impl Into<MovieId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            release_year: None,
            genre: BTreeSet::new(),
            average_rating: 0.0,
            total_reviews: 0,
            duration: None,
            cast: Vec::new(),
            synopsis: None,
            director: None,
            poster_url: None,
            backdrop_url: None,
            trailer_url: None,
        }
    }
}

/// Sort keys accepted by the movies endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MovieSort {
    #[default]
    AverageRating,
    ReleaseYear,
    Title,
    TotalReviews,
}

impl MovieSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieSort::AverageRating => "averageRating",
            MovieSort::ReleaseYear => "releaseYear",
            MovieSort::Title => "title",
            MovieSort::TotalReviews => "totalReviews",
        }
    }
}

/// Catalog filters sent along with a movies page request
///
/// Empty fields are omitted from the query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f32>,
    #[serde(default)]
    pub sort: MovieSort,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl MovieFilters {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: Some(query.into()),
            ..Self::default()
        }
    }

    /// Query parameters for the movies endpoint, excluding the page number
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(genre) = self.genre.as_ref().filter(|g| !g.is_empty()) {
            params.push(("genre", genre.clone()));
        }
        if let Some(year) = self.year {
            params.push(("year", year.to_string()));
        }
        if let Some(rating) = self.min_rating {
            params.push(("rating", rating.to_string()));
        }
        params.push(("sort", self.sort.as_str().to_string()));
        if let Some(search) = self.search.as_ref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.trim().to_string()));
        }
        params
    }
}
