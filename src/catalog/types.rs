//! Catalog records as served by the PetCare API and kept in the local store.
//!
//! Field names follow the API's camelCase JSON. Every field has a default so
//! a sparse payload still decodes; weak references (`breed_id`, `shelter_id`,
//! `user_id`, `manager_id`, `species_id`) are plain ids with no integrity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Values the API uses for [`Animal::status`]. The field stays a string so
/// unknown statuses survive a round trip.
pub mod status {
  pub const AVAILABLE: &str = "available";
  pub const ADOPTED: &str = "adopted";
  pub const RESERVED: &str = "reserved";
  pub const IN_TREATMENT: &str = "inTreatment";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Animal {
  pub id: String,
  pub slug: String,
  pub name: String,
  pub breed_id: Option<String>,
  pub status: String,
  pub shelter_id: Option<String>,
  pub user_id: Option<String>,
  pub birthday: Option<String>,
  pub gender: Option<String>,
  pub description: Option<String>,
  pub health_status: Option<String>,
  pub photos: Vec<String>,
  pub videos: Vec<String>,
  pub adoption_requirements: Option<String>,
  pub microchip_id: Option<String>,
  pub id_number: Option<i64>,
  pub weight: Option<f64>,
  pub height: Option<f64>,
  pub color: Option<String>,
  pub is_sterilized: bool,
  pub have_documents: bool,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

impl Animal {
  pub fn is_available(&self) -> bool {
    self.status.eq_ignore_ascii_case(status::AVAILABLE)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub lat: f64,
  pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shelter {
  pub id: String,
  pub slug: String,
  pub name: String,
  pub address: String,
  pub coordinates: Coordinates,
  pub contact_phone: Option<String>,
  pub contact_email: Option<String>,
  pub description: Option<String>,
  pub capacity: u32,
  pub current_occupancy: u32,
  pub photos: Vec<String>,
  pub virtual_tour_url: Option<String>,
  pub working_hours: Option<String>,
  // BTreeMap keeps serialization (and so the stored content hash) stable
  pub social_media: BTreeMap<String, String>,
  pub manager_id: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

impl Shelter {
  /// Free places, never negative.
  pub fn free_places(&self) -> u32 {
    self.capacity.saturating_sub(self.current_occupancy)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Species {
  pub id: String,
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Breed {
  pub id: String,
  pub species_id: String,
  pub name: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
  pub id: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
  pub role: String,
  pub language: Option<String>,
  pub profile_photo: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

impl User {
  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
      .trim()
      .to_string()
  }
}
