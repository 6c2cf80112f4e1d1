use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CastMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Locally cached copy of a catalog movie, keyed by the catalog's own id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub casts: Vec<CastMember>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub runtime: Option<i64>,
}

impl Movie {
    /// Stand-in for a movie whose cached document is gone; only the id is known.
    pub fn unresolved(id: impl Into<String>) -> Self {
        Movie {
            id: id.into(),
            title: String::new(),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            genres: Vec::new(),
            casts: Vec::new(),
            release_date: None,
            original_language: None,
            tagline: String::new(),
            vote_average: 0.0,
            runtime: None,
        }
    }
}

/// One entry of the catalog's "now playing" listing, passed through to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub original_language: Option<String>,
}
