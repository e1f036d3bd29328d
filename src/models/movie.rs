use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Movie genre, a closed enumeration
///
/// Wire format and database representation both use the kebab-case form
/// (e.g. "sci-fi"), so the same value round-trips through query strings,
/// JSON bodies and the `genre` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "genre", rename_all = "kebab-case")]
pub enum Genre {
    Action,
    Comedy,
    Drama,
    Horror,
    SciFi,
    Romance,
    Thriller,
    Documentary,
}

impl Genre {
    /// All genres, in display order
    pub const ALL: [Genre; 8] = [
        Genre::Action,
        Genre::Comedy,
        Genre::Drama,
        Genre::Horror,
        Genre::SciFi,
        Genre::Romance,
        Genre::Thriller,
        Genre::Documentary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "action",
            Genre::Comedy => "comedy",
            Genre::Drama => "drama",
            Genre::Horror => "horror",
            Genre::SciFi => "sci-fi",
            Genre::Romance => "romance",
            Genre::Thriller => "thriller",
            Genre::Documentary => "documentary",
        }
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A movie record as stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub genre: Genre,
    pub release_date: NaiveDate,
    pub director: String,
    /// Reference to the poster image (path or URL); the upload collaborator
    /// owns the bytes
    pub poster: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Creator reference; survives deletion of the creator as NULL
    pub created_by: Option<i64>,
}

/// Fields required to insert a movie
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub genre: Genre,
    pub release_date: NaiveDate,
    pub director: String,
    pub poster: Option<String>,
    pub created_by: Option<i64>,
}

/// A movie annotated with its aggregate rating
///
/// `average_rating` is already rounded to one decimal place, with 0.0 as
/// the no-ratings sentinel (real scores are never below 1.0).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatedMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub average_rating: f64,
    pub rating_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_serde_kebab_case() {
        let json = serde_json::to_string(&Genre::SciFi).unwrap();
        assert_eq!(json, "\"sci-fi\"");

        let parsed: Genre = serde_json::from_str("\"documentary\"").unwrap();
        assert_eq!(parsed, Genre::Documentary);
    }

    #[test]
    fn test_genre_rejects_unknown_value() {
        let parsed: Result<Genre, _> = serde_json::from_str("\"western\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_genre_display_matches_wire_form() {
        for genre in Genre::ALL {
            let json = serde_json::to_string(&genre).unwrap();
            assert_eq!(json, format!("\"{}\"", genre));
        }
    }

    #[test]
    fn test_rated_movie_flattens_into_one_object() {
        let movie = Movie {
            id: 1,
            title: "Alien".to_string(),
            description: "In space no one can hear you scream".to_string(),
            genre: Genre::SciFi,
            release_date: NaiveDate::from_ymd_opt(1979, 5, 25).unwrap(),
            director: "Ridley Scott".to_string(),
            poster: None,
            created_at: Utc::now(),
            created_by: None,
        };
        let rated = RatedMovie {
            movie,
            average_rating: 8.7,
            rating_count: 3,
        };

        let value = serde_json::to_value(&rated).unwrap();
        assert_eq!(value["title"], "Alien");
        assert_eq!(value["average_rating"], 8.7);
        assert_eq!(value["rating_count"], 3);
    }
}
