use serde::{Deserialize, Serialize};

use super::CatBreed;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatImage {
    pub id: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub breeds: Vec<CatBreed>,
    #[serde(default)]
    pub categories: Vec<ImageCategory>,
}

impl CatImage {
    pub fn breed_names(&self) -> String {
        if self.breeds.is_empty() {
            return "Unknown breed".to_string();
        }
        self.breeds
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Thumb,
    Small,
    Medium,
    Full,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Thumb => "thumb",
            ImageSize::Small => "small",
            ImageSize::Medium => "medium",
            ImageSize::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeType {
    Jpg,
    Png,
    Gif,
}

impl MimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Jpg => "jpg",
            MimeType::Png => "png",
            MimeType::Gif => "gif",
        }
    }
}

/// Query parameters for the image listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageQuery {
    pub breed_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub size: Option<ImageSize>,
    pub mime_types: Option<MimeType>,
}

impl ImageQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref breed_id) = self.breed_id {
            params.push(("breed_id", breed_id.clone()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(size) = self.size {
            params.push(("size", size.as_str().to_string()));
        }
        if let Some(mime) = self.mime_types {
            params.push(("mime_types", mime.as_str().to_string()));
        }
        params
    }
}
