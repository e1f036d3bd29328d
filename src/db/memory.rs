use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::db::store::{MovieQuery, MovieSort, RatingStats, ReviewStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    Comment, Genre, Movie, NewMovie, Profile, RatedMovie, Rating, Review, User,
};
use crate::services::aggregation::round_rating;

/// In-memory `ReviewStore`
///
/// Backs the integration test suite and any deployment that does not need
/// durability. Query specifications and the cascade rules are evaluated in
/// plain Rust with the same observable semantics as the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    /// Keyed by user id (1:1)
    profiles: HashMap<i64, Profile>,
    movies: HashMap<i64, Movie>,
    ratings: HashMap<i64, Rating>,
    reviews: HashMap<i64, Review>,
    comments: HashMap<i64, Comment>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn stats_for(&self, movie_id: i64) -> RatingStats {
        let values: Vec<i32> = self
            .ratings
            .values()
            .filter(|r| r.movie_id == movie_id)
            .map(|r| r.value)
            .collect();

        if values.is_empty() {
            RatingStats::default()
        } else {
            let sum: i64 = values.iter().map(|v| *v as i64).sum();
            RatingStats {
                average: Some(sum as f64 / values.len() as f64),
                count: values.len() as i64,
            }
        }
    }

    fn annotate(&self, movie: Movie) -> RatedMovie {
        let stats = self.stats_for(movie.id);
        RatedMovie {
            movie,
            average_rating: round_rating(stats.average),
            rating_count: stats.count,
        }
    }

    /// Sorts (movie, raw stats) pairs: best raw average first with unrated
    /// movies last, movie id ascending on ties
    fn sort_by_average(entries: &mut [(Movie, RatingStats)]) {
        entries.sort_by(|(a_movie, a_stats), (b_movie, b_stats)| {
            match (b_stats.average, a_stats.average) {
                (Some(b_avg), Some(a_avg)) => b_avg
                    .partial_cmp(&a_avg)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a_movie.id.cmp(&b_movie.id)),
                (Some(_), None) => std::cmp::Ordering::Greater,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (None, None) => a_movie.id.cmp(&b_movie.id),
            }
        });
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create_user(&self, username: &str) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.username == username) {
            return Err(AppError::Validation(format!(
                "username {} is already taken",
                username
            )));
        }

        let user = User {
            id: inner.next_id(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn delete_user(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;

        if inner.users.remove(&id).is_none() {
            return Ok(false);
        }

        inner.profiles.remove(&id);
        inner.ratings.retain(|_, r| r.user_id != id);

        // Deleting the user's reviews also takes their comment threads,
        // including comments written by other users
        let review_ids: HashSet<i64> = inner
            .reviews
            .values()
            .filter(|r| r.user_id == id)
            .map(|r| r.id)
            .collect();
        inner.reviews.retain(|_, r| r.user_id != id);
        inner
            .comments
            .retain(|_, c| c.user_id != id && !review_ids.contains(&c.review_id));

        // Movies survive with a null creator
        for movie in inner.movies.values_mut() {
            if movie.created_by == Some(id) {
                movie.created_by = None;
            }
        }

        Ok(true)
    }

    async fn get_or_create_profile(&self, user_id: i64) -> AppResult<Profile> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&user_id) {
            return Err(AppError::NotFound(format!("user {} not found", user_id)));
        }

        if let Some(profile) = inner.profiles.get(&user_id) {
            return Ok(profile.clone());
        }

        let profile = Profile {
            id: inner.next_id(),
            user_id,
            bio: None,
            avatar: None,
            created_at: Utc::now(),
        };
        inner.profiles.insert(user_id, profile.clone());
        Ok(profile)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        bio: Option<String>,
        avatar: Option<String>,
    ) -> AppResult<Profile> {
        // Lazy creation applies here too
        self.get_or_create_profile(user_id).await?;

        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", user_id)))?;
        profile.bio = bio;
        profile.avatar = avatar;
        Ok(profile.clone())
    }

    async fn insert_movie(&self, new: NewMovie) -> AppResult<Movie> {
        let mut inner = self.inner.write().await;
        let movie = Movie {
            id: inner.next_id(),
            title: new.title,
            description: new.description,
            genre: new.genre,
            release_date: new.release_date,
            director: new.director,
            poster: new.poster,
            created_at: Utc::now(),
            created_by: new.created_by,
        };
        inner.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn get_movie(&self, id: i64) -> AppResult<Option<Movie>> {
        Ok(self.inner.read().await.movies.get(&id).cloned())
    }

    async fn delete_movie(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;

        if inner.movies.remove(&id).is_none() {
            return Ok(false);
        }

        inner.ratings.retain(|_, r| r.movie_id != id);

        let review_ids: HashSet<i64> = inner
            .reviews
            .values()
            .filter(|r| r.movie_id == id)
            .map(|r| r.id)
            .collect();
        inner.reviews.retain(|_, r| r.movie_id != id);
        inner
            .comments
            .retain(|_, c| !review_ids.contains(&c.review_id));

        Ok(true)
    }

    async fn list_movies(&self, query: &MovieQuery) -> AppResult<Vec<RatedMovie>> {
        let inner = self.inner.read().await;

        let mut entries: Vec<(Movie, RatingStats)> = inner
            .movies
            .values()
            .filter(|m| query.genre.map_or(true, |g| m.genre == g))
            .filter(|m| {
                query
                    .year
                    .map_or(true, |y| chrono::Datelike::year(&m.release_date) == y)
            })
            .map(|m| (m.clone(), inner.stats_for(m.id)))
            .filter(|(_, stats)| {
                query
                    .min_rating_count
                    .map_or(true, |min| stats.count >= min)
            })
            .collect();

        match query.sort {
            MovieSort::CreatedDesc => entries.sort_by(|(a, _), (b, _)| {
                b.created_at
                    .cmp(&a.created_at)
                    .then(b.id.cmp(&a.id))
            }),
            MovieSort::AverageDesc => Inner::sort_by_average(&mut entries),
        }

        if let Some(limit) = query.limit {
            entries.truncate(limit);
        }

        Ok(entries
            .into_iter()
            .map(|(movie, stats)| RatedMovie {
                movie,
                average_rating: round_rating(stats.average),
                rating_count: stats.count,
            })
            .collect())
    }

    async fn release_years(&self) -> AppResult<Vec<i32>> {
        let inner = self.inner.read().await;
        let mut years: Vec<i32> = inner
            .movies
            .values()
            .map(|m| chrono::Datelike::year(&m.release_date))
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }

    async fn upsert_rating(
        &self,
        movie_id: i64,
        user_id: i64,
        value: i32,
    ) -> AppResult<(Rating, bool)> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner
            .ratings
            .values_mut()
            .find(|r| r.movie_id == movie_id && r.user_id == user_id)
        {
            existing.value = value;
            return Ok((existing.clone(), false));
        }

        let rating = Rating {
            id: inner.next_id(),
            movie_id,
            user_id,
            value,
            created_at: Utc::now(),
        };
        inner.ratings.insert(rating.id, rating.clone());
        Ok((rating, true))
    }

    async fn user_rating(&self, movie_id: i64, user_id: i64) -> AppResult<Option<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .values()
            .find(|r| r.movie_id == movie_id && r.user_id == user_id)
            .cloned())
    }

    async fn ratings_by_user(&self, user_id: i64) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        let mut ratings: Vec<Rating> = inner
            .ratings
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(ratings)
    }

    async fn list_ratings(&self) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        let mut ratings: Vec<Rating> = inner.ratings.values().cloned().collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(ratings)
    }

    async fn rating_stats(&self, movie_id: i64) -> AppResult<RatingStats> {
        Ok(self.inner.read().await.stats_for(movie_id))
    }

    async fn insert_review(
        &self,
        movie_id: i64,
        user_id: i64,
        title: &str,
        body: &str,
    ) -> AppResult<Review> {
        let mut inner = self.inner.write().await;

        if !inner.movies.contains_key(&movie_id) {
            return Err(AppError::NotFound(format!("movie {} not found", movie_id)));
        }

        let now = Utc::now();
        let review = Review {
            id: inner.next_id(),
            movie_id,
            user_id,
            title: title.to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn get_review(&self, id: i64) -> AppResult<Option<Review>> {
        Ok(self.inner.read().await.reviews.get(&id).cloned())
    }

    async fn update_review(
        &self,
        id: i64,
        title: &str,
        body: &str,
    ) -> AppResult<Option<Review>> {
        let mut inner = self.inner.write().await;
        match inner.reviews.get_mut(&id) {
            Some(review) => {
                review.title = title.to_string();
                review.body = body.to_string();
                review.updated_at = Utc::now();
                Ok(Some(review.clone()))
            }
            None => Ok(None),
        }
    }

    async fn recent_reviews(&self, limit: Option<usize>) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner.reviews.values().cloned().collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            reviews.truncate(limit);
        }
        Ok(reviews)
    }

    async fn reviews_for_movie(&self, movie_id: i64) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn reviews_by_user(&self, user_id: i64) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn insert_comment(
        &self,
        review_id: i64,
        user_id: i64,
        body: &str,
    ) -> AppResult<Comment> {
        let mut inner = self.inner.write().await;

        if !inner.reviews.contains_key(&review_id) {
            return Err(AppError::NotFound(format!(
                "review {} not found",
                review_id
            )));
        }

        let comment = Comment {
            id: inner.next_id(),
            review_id,
            user_id,
            body: body.to_string(),
            created_at: Utc::now(),
        };
        inner.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn comments_for_review(&self, review_id: i64) -> AppResult<Vec<Comment>> {
        let inner = self.inner.read().await;
        let mut comments: Vec<Comment> = inner
            .comments
            .values()
            .filter(|c| c.review_id == review_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn favorite_genres(&self, user_id: i64, min_value: i32) -> AppResult<Vec<Genre>> {
        let inner = self.inner.read().await;
        let mut seen = HashSet::new();
        let mut genres = Vec::new();

        let mut ratings: Vec<&Rating> = inner
            .ratings
            .values()
            .filter(|r| r.user_id == user_id && r.value >= min_value)
            .collect();
        ratings.sort_by_key(|r| r.id);

        for rating in ratings {
            if let Some(movie) = inner.movies.get(&rating.movie_id) {
                if seen.insert(movie.genre) {
                    genres.push(movie.genre);
                }
            }
        }

        Ok(genres)
    }

    async fn unrated_in_genres(
        &self,
        user_id: i64,
        genres: &[Genre],
        limit: usize,
    ) -> AppResult<Vec<RatedMovie>> {
        let inner = self.inner.read().await;

        let rated_ids: HashSet<i64> = inner
            .ratings
            .values()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.movie_id)
            .collect();

        let mut entries: Vec<(Movie, RatingStats)> = inner
            .movies
            .values()
            .filter(|m| genres.contains(&m.genre) && !rated_ids.contains(&m.id))
            .map(|m| (m.clone(), inner.stats_for(m.id)))
            .collect();

        Inner::sort_by_average(&mut entries);
        entries.truncate(limit);

        Ok(entries
            .into_iter()
            .map(|(movie, stats)| RatedMovie {
                movie,
                average_rating: round_rating(stats.average),
                rating_count: stats.count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_movie(title: &str, genre: Genre, year: i32, created_by: Option<i64>) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            description: format!("{} description", title),
            genre,
            release_date: NaiveDate::from_ymd_opt(year, 6, 1).unwrap(),
            director: "Director".to_string(),
            poster: None,
            created_by,
        }
    }

    #[tokio::test]
    async fn test_upsert_never_duplicates_rows() {
        let store = MemoryStore::new();
        let user = store.create_user("alice").await.unwrap();
        let movie = store
            .insert_movie(new_movie("Arrival", Genre::SciFi, 2016, None))
            .await
            .unwrap();

        let (first, created) = store.upsert_rating(movie.id, user.id, 5).await.unwrap();
        assert!(created);

        let (second, created) = store.upsert_rating(movie.id, user.id, 9).await.unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.value, 9);

        let stats = store.rating_stats(movie.id).await.unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.average, Some(9.0));
    }

    #[tokio::test]
    async fn test_movie_delete_cascades_to_ratings_reviews_comments() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let bob = store.create_user("bob").await.unwrap();
        let movie = store
            .insert_movie(new_movie("Jaws", Genre::Thriller, 1975, None))
            .await
            .unwrap();

        store.upsert_rating(movie.id, alice.id, 8).await.unwrap();
        let review = store
            .insert_review(movie.id, alice.id, "Classic", "Still holds up")
            .await
            .unwrap();
        store
            .insert_comment(review.id, bob.id, "Agreed")
            .await
            .unwrap();

        assert!(store.delete_movie(movie.id).await.unwrap());

        assert_eq!(store.rating_stats(movie.id).await.unwrap().count, 0);
        assert!(store.get_review(review.id).await.unwrap().is_none());
        assert!(store
            .comments_for_review(review.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_user_delete_cascades_but_movies_survive() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let bob = store.create_user("bob").await.unwrap();
        let movie = store
            .insert_movie(new_movie("Rocky", Genre::Drama, 1976, Some(alice.id)))
            .await
            .unwrap();

        store.upsert_rating(movie.id, alice.id, 7).await.unwrap();
        let review = store
            .insert_review(movie.id, alice.id, "Inspiring", "Gonna fly now")
            .await
            .unwrap();
        store
            .insert_comment(review.id, bob.id, "Yes!")
            .await
            .unwrap();
        store.get_or_create_profile(alice.id).await.unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());

        // Everything the user wrote is gone, including comment threads
        // under their reviews
        assert!(store.ratings_by_user(alice.id).await.unwrap().is_empty());
        assert!(store.get_review(review.id).await.unwrap().is_none());
        assert!(store
            .comments_for_review(review.id)
            .await
            .unwrap()
            .is_empty());

        // The movie remains, creator-less
        let survivor = store.get_movie(movie.id).await.unwrap().unwrap();
        assert_eq!(survivor.created_by, None);
    }

    #[tokio::test]
    async fn test_profile_created_lazily_once() {
        let store = MemoryStore::new();
        let user = store.create_user("carol").await.unwrap();

        let first = store.get_or_create_profile(user.id).await.unwrap();
        assert_eq!(first.bio, None);

        let second = store.get_or_create_profile(user.id).await.unwrap();
        assert_eq!(second.id, first.id);

        let updated = store
            .update_profile(user.id, Some("Film nerd".to_string()), None)
            .await
            .unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.bio.as_deref(), Some("Film nerd"));
    }

    #[tokio::test]
    async fn test_list_movies_filters_and_tie_break() {
        let store = MemoryStore::new();
        let user = store.create_user("dave").await.unwrap();
        let other = store.create_user("erin").await.unwrap();

        let first = store
            .insert_movie(new_movie("First", Genre::Comedy, 2001, None))
            .await
            .unwrap();
        let second = store
            .insert_movie(new_movie("Second", Genre::Comedy, 2002, None))
            .await
            .unwrap();
        let drama = store
            .insert_movie(new_movie("Other", Genre::Drama, 2001, None))
            .await
            .unwrap();

        // Equal averages: tie must break by movie id ascending
        store.upsert_rating(first.id, user.id, 8).await.unwrap();
        store.upsert_rating(second.id, user.id, 8).await.unwrap();
        store.upsert_rating(drama.id, other.id, 9).await.unwrap();

        let top = store.list_movies(&MovieQuery::top_rated(10)).await.unwrap();
        let ids: Vec<i64> = top.iter().map(|m| m.movie.id).collect();
        assert_eq!(ids, vec![drama.id, first.id, second.id]);

        let comedies = store
            .list_movies(&MovieQuery::latest(Some(Genre::Comedy), None))
            .await
            .unwrap();
        assert_eq!(comedies.len(), 2);

        let from_2001 = store
            .list_movies(&MovieQuery::latest(None, Some(2001)))
            .await
            .unwrap();
        assert_eq!(from_2001.len(), 2);

        assert_eq!(store.release_years().await.unwrap(), vec![2002, 2001]);
    }

    #[tokio::test]
    async fn test_unrated_in_genres_excludes_rated_and_sorts_unrated_last() {
        let store = MemoryStore::new();
        let user = store.create_user("frank").await.unwrap();
        let other = store.create_user("grace").await.unwrap();

        let rated = store
            .insert_movie(new_movie("Seen", Genre::Horror, 2018, None))
            .await
            .unwrap();
        let best = store
            .insert_movie(new_movie("Best", Genre::Horror, 2019, None))
            .await
            .unwrap();
        let unrated = store
            .insert_movie(new_movie("Quiet", Genre::Horror, 2020, None))
            .await
            .unwrap();

        store.upsert_rating(rated.id, user.id, 9).await.unwrap();
        store.upsert_rating(best.id, other.id, 10).await.unwrap();

        let picks = store
            .unrated_in_genres(user.id, &[Genre::Horror], 10)
            .await
            .unwrap();
        let ids: Vec<i64> = picks.iter().map(|m| m.movie.id).collect();
        // Rated-by-user excluded; movie with ratings outranks the unrated one
        assert_eq!(ids, vec![best.id, unrated.id]);
        assert_eq!(picks[1].average_rating, 0.0);
    }
}
