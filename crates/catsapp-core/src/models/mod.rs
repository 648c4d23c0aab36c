//! Data models for the cats catalog.
//!
//! This module contains the data structures exchanged with the catalog
//! backend:
//!
//! - `User`, `UserProfile`: Account data and the typed profile kept in the session
//! - `AuthResponse`, `LoginRequest`, `RegisterRequest`: Authentication payloads
//! - `CatBreed`, `BreedQuery`, `BreedFilter`, `BreedStatistics`: Breed listings, filtering and summaries
//! - `CatImage`, `ImageQuery`: Image listings

pub mod breed;
pub mod image;
pub mod user;

pub use breed::{BreedFilter, BreedQuery, BreedStatistics, BreedWeight, CatBreed};
pub use image::{CatImage, ImageCategory, ImageQuery, ImageSize, MimeType};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, User, UserProfile};
