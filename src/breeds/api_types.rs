//! Serde-deserializable types matching TheCatAPI responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use super::types::{Breed, Lifespan};

#[derive(Debug, Deserialize)]
pub struct ApiImage {
  #[serde(default)]
  pub url: String,
}

/// One entry of `GET /breeds`.
#[derive(Debug, Deserialize)]
pub struct ApiBreed {
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub origin: String,
  #[serde(default)]
  pub temperament: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub life_span: String,
  pub image: Option<ApiImage>,
}

impl ApiBreed {
  pub fn into_breed(self) -> Breed {
    Breed {
      lifespan: parse_lifespan(&self.life_span),
      image_url: self.image.map(|i| i.url).unwrap_or_default(),
      id: self.id,
      name: self.name,
      origin: self.origin,
      temperament: self.temperament,
      description: self.description,
      is_favorite: false,
    }
  }
}

/// Parse strings like "14 - 15" into a range.
///
/// Missing numbers fall back to the other bound, then to zero.
fn parse_lifespan(raw: &str) -> Lifespan {
  static NUMBER: OnceLock<Regex> = OnceLock::new();
  let number = NUMBER.get_or_init(|| Regex::new(r"\d+").expect("valid regex"));

  let mut numbers = number
    .find_iter(raw)
    .filter_map(|m| m.as_str().parse::<u32>().ok());

  let low = numbers.next().unwrap_or(0);
  let high = numbers.next().unwrap_or(low);
  Lifespan::new(low, high)
}
