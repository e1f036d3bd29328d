pub mod movie;
pub mod rating;
pub mod review;
pub mod user;

pub use movie::{Genre, Movie, NewMovie, RatedMovie};
pub use rating::Rating;
pub use review::{Comment, Review, ReviewWithComments};
pub use user::{Profile, User};
