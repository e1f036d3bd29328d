use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

use crate::db::store::{MovieQuery, MovieSort, RatingStats, ReviewStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    Comment, Genre, Movie, NewMovie, Profile, RatedMovie, Rating, Review, User,
};
use crate::services::aggregation::round_rating;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const MOVIE_COLUMNS: &str =
    "m.id, m.title, m.description, m.genre, m.release_date, m.director, m.poster, \
     m.created_at, m.created_by";

/// PostgreSQL-backed `ReviewStore`
///
/// Upsert and cascade semantics are enforced by the schema (unique
/// (movie_id, user_id), ON DELETE CASCADE / SET NULL); aggregates are
/// computed per query, never stored.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_profile(&self, user_id: i64) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, bio, avatar, created_at FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }
}

/// Movie row joined with its aggregate figures
#[derive(sqlx::FromRow)]
struct RatedMovieRow {
    #[sqlx(flatten)]
    movie: Movie,
    avg_value: Option<f64>,
    rating_count: i64,
}

impl From<RatedMovieRow> for RatedMovie {
    fn from(row: RatedMovieRow) -> Self {
        RatedMovie {
            movie: row.movie,
            average_rating: round_rating(row.avg_value),
            rating_count: row.rating_count,
        }
    }
}

/// Rating row carrying the upsert outcome; `xmax = 0` distinguishes a
/// freshly inserted row from a conflict update
#[derive(sqlx::FromRow)]
struct UpsertRatingRow {
    #[sqlx(flatten)]
    rating: Rating,
    inserted: bool,
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    average: Option<f64>,
    count: i64,
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn create_user(&self, username: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username) VALUES ($1) RETURNING id, username, created_at",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation(format!("username {} is already taken", username))
            }
            _ => AppError::from(e),
        })
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> AppResult<bool> {
        // Ratings, reviews, comments and the profile go with the user;
        // movies survive with created_by set to NULL (schema-level rules)
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_or_create_profile(&self, user_id: i64) -> AppResult<Profile> {
        if let Some(profile) = self.find_profile(user_id).await? {
            return Ok(profile);
        }

        let inserted = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO NOTHING \
             RETURNING id, user_id, bio, avatar, created_at",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(profile) => Ok(profile),
            // Lost a creation race; the row exists now
            None => self
                .find_profile(user_id)
                .await?
                .ok_or_else(|| AppError::Internal("profile creation raced".to_string())),
        }
    }

    async fn update_profile(
        &self,
        user_id: i64,
        bio: Option<String>,
        avatar: Option<String>,
    ) -> AppResult<Profile> {
        self.get_or_create_profile(user_id).await?;

        let profile = sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET bio = $2, avatar = $3 WHERE user_id = $1 \
             RETURNING id, user_id, bio, avatar, created_at",
        )
        .bind(user_id)
        .bind(bio)
        .bind(avatar)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_movie(&self, new: NewMovie) -> AppResult<Movie> {
        let movie = sqlx::query_as::<_, Movie>(
            "INSERT INTO movies (title, description, genre, release_date, director, poster, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, title, description, genre, release_date, director, poster, created_at, created_by",
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.genre)
        .bind(new.release_date)
        .bind(new.director)
        .bind(new.poster)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn get_movie(&self, id: i64) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, description, genre, release_date, director, poster, \
             created_at, created_by FROM movies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn delete_movie(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_movies(&self, query: &MovieQuery) -> AppResult<Vec<RatedMovie>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {}, CAST(AVG(r.value) AS DOUBLE PRECISION) AS avg_value, \
             COUNT(r.id) AS rating_count \
             FROM movies m LEFT JOIN ratings r ON r.movie_id = m.id",
            MOVIE_COLUMNS
        ));

        if let Some(genre) = query.genre {
            builder.push(" WHERE m.genre = ").push_bind(genre);
        }
        if let Some(year) = query.year {
            builder
                .push(if query.genre.is_some() { " AND " } else { " WHERE " })
                .push("EXTRACT(YEAR FROM m.release_date)::int = ")
                .push_bind(year);
        }

        builder.push(" GROUP BY m.id");

        if let Some(min_count) = query.min_rating_count {
            builder
                .push(" HAVING COUNT(r.id) >= ")
                .push_bind(min_count);
        }

        match query.sort {
            MovieSort::CreatedDesc => {
                builder.push(" ORDER BY m.created_at DESC, m.id DESC");
            }
            MovieSort::AverageDesc => {
                builder.push(" ORDER BY avg_value DESC NULLS LAST, m.id ASC");
            }
        }

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows: Vec<RatedMovieRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RatedMovie::from).collect())
    }

    async fn release_years(&self) -> AppResult<Vec<i32>> {
        let years = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT EXTRACT(YEAR FROM release_date)::int AS year \
             FROM movies ORDER BY year DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(years)
    }

    async fn upsert_rating(
        &self,
        movie_id: i64,
        user_id: i64,
        value: i32,
    ) -> AppResult<(Rating, bool)> {
        let row = sqlx::query_as::<_, UpsertRatingRow>(
            "INSERT INTO ratings (movie_id, user_id, value) VALUES ($1, $2, $3) \
             ON CONFLICT (movie_id, user_id) DO UPDATE SET value = EXCLUDED.value \
             RETURNING id, movie_id, user_id, value, created_at, (xmax = 0) AS inserted",
        )
        .bind(movie_id)
        .bind(user_id)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok((row.rating, row.inserted))
    }

    async fn user_rating(&self, movie_id: i64, user_id: i64) -> AppResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>(
            "SELECT id, movie_id, user_id, value, created_at FROM ratings \
             WHERE movie_id = $1 AND user_id = $2",
        )
        .bind(movie_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rating)
    }

    async fn ratings_by_user(&self, user_id: i64) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT id, movie_id, user_id, value, created_at FROM ratings \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    async fn list_ratings(&self) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT id, movie_id, user_id, value, created_at FROM ratings \
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    async fn rating_stats(&self, movie_id: i64) -> AppResult<RatingStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT CAST(AVG(value) AS DOUBLE PRECISION) AS average, COUNT(*) AS count \
             FROM ratings WHERE movie_id = $1",
        )
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(RatingStats {
            average: row.average,
            count: row.count,
        })
    }

    async fn insert_review(
        &self,
        movie_id: i64,
        user_id: i64,
        title: &str,
        body: &str,
    ) -> AppResult<Review> {
        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (movie_id, user_id, title, body) VALUES ($1, $2, $3, $4) \
             RETURNING id, movie_id, user_id, title, body, created_at, updated_at",
        )
        .bind(movie_id)
        .bind(user_id)
        .bind(title)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(review)
    }

    async fn get_review(&self, id: i64) -> AppResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT id, movie_id, user_id, title, body, created_at, updated_at \
             FROM reviews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn update_review(
        &self,
        id: i64,
        title: &str,
        body: &str,
    ) -> AppResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            "UPDATE reviews SET title = $2, body = $3, updated_at = NOW() WHERE id = $1 \
             RETURNING id, movie_id, user_id, title, body, created_at, updated_at",
        )
        .bind(id)
        .bind(title)
        .bind(body)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn recent_reviews(&self, limit: Option<usize>) -> AppResult<Vec<Review>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, movie_id, user_id, title, body, created_at, updated_at \
             FROM reviews ORDER BY created_at DESC, id DESC",
        );
        if let Some(limit) = limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let reviews: Vec<Review> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(reviews)
    }

    async fn reviews_for_movie(&self, movie_id: i64) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT id, movie_id, user_id, title, body, created_at, updated_at \
             FROM reviews WHERE movie_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn reviews_by_user(&self, user_id: i64) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT id, movie_id, user_id, title, body, created_at, updated_at \
             FROM reviews WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn insert_comment(
        &self,
        review_id: i64,
        user_id: i64,
        body: &str,
    ) -> AppResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (review_id, user_id, body) VALUES ($1, $2, $3) \
             RETURNING id, review_id, user_id, body, created_at",
        )
        .bind(review_id)
        .bind(user_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn comments_for_review(&self, review_id: i64) -> AppResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, review_id, user_id, body, created_at FROM comments \
             WHERE review_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn favorite_genres(&self, user_id: i64, min_value: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_scalar::<_, Genre>(
            "SELECT DISTINCT m.genre FROM ratings r \
             JOIN movies m ON m.id = r.movie_id \
             WHERE r.user_id = $1 AND r.value >= $2",
        )
        .bind(user_id)
        .bind(min_value)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn unrated_in_genres(
        &self,
        user_id: i64,
        genres: &[Genre],
        limit: usize,
    ) -> AppResult<Vec<RatedMovie>> {
        let sql = format!(
            "SELECT {}, CAST(AVG(r.value) AS DOUBLE PRECISION) AS avg_value, \
             COUNT(r.id) AS rating_count \
             FROM movies m LEFT JOIN ratings r ON r.movie_id = m.id \
             WHERE m.genre = ANY($1) \
               AND NOT EXISTS (SELECT 1 FROM ratings mine \
                               WHERE mine.movie_id = m.id AND mine.user_id = $2) \
             GROUP BY m.id \
             ORDER BY avg_value DESC NULLS LAST, m.id ASC \
             LIMIT $3",
            MOVIE_COLUMNS
        );
        let rows = sqlx::query_as::<_, RatedMovieRow>(&sql)
            .bind(genres.to_vec())
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RatedMovie::from).collect())
    }
}
