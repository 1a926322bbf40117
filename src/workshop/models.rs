//! Workshop entity and API-facing views.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a workshop.
///
/// A soft-deleted workshop stays in the primary store (audit, restore) but is
/// removed from the search index, so parents never find it while browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkshopStatus {
    Active,
    SoftDeleted,
}

impl WorkshopStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            WorkshopStatus::Active => "ACTIVE",
            WorkshopStatus::SoftDeleted => "SOFT_DELETED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(WorkshopStatus::Active),
            "SOFT_DELETED" => Some(WorkshopStatus::SoftDeleted),
            _ => None,
        }
    }
}

/// A provider's workshop offering, as stored in the primary database.
///
/// The primary store's copy is authoritative; the search index only ever
/// holds a derived projection of these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workshop {
    /// Unique identifier (UUID), assigned at creation, immutable.
    pub id: String,
    /// Owning provider reference.
    pub provider_id: String,
    /// Workshop title.
    pub title: String,
    /// Display title of the owning provider (denormalized for search).
    pub provider_title: String,
    /// Free-text keywords used by text search.
    pub keywords: String,
    /// Minimum age of participants.
    pub min_age: u32,
    /// Maximum age of participants.
    pub max_age: u32,
    /// Price per attendance.
    pub price: f64,
    /// Seats the provider offers.
    pub available_seats: u32,
    /// Seats already taken by accepted applications.
    pub taken_seats: u32,
    /// Average parent rating, used for search ranking.
    pub rating: f64,
    /// Lifecycle state.
    pub status: WorkshopStatus,
    /// When the workshop was created (Unix timestamp).
    pub created_at: i64,
}

impl Workshop {
    /// Create a new active workshop with a fresh UUID.
    pub fn new(provider_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider_id: provider_id.into(),
            title: title.into(),
            provider_title: String::new(),
            keywords: String::new(),
            min_age: 0,
            max_age: 18,
            price: 0.0,
            available_seats: 0,
            taken_seats: 0,
            rating: 0.0,
            status: WorkshopStatus::Active,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_provider_title(mut self, provider_title: impl Into<String>) -> Self {
        self.provider_title = provider_title.into();
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_age_range(mut self, min_age: u32, max_age: u32) -> Self {
        self.min_age = min_age;
        self.max_age = max_age;
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_seats(mut self, available: u32, taken: u32) -> Self {
        self.available_seats = available;
        self.taken_seats = taken;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == WorkshopStatus::Active
    }

    /// A seat count is acceptable only if it covers the seats already taken.
    pub fn seats_valid_for_update(&self, new_available_seats: u32) -> bool {
        new_available_seats >= self.taken_seats
    }
}

/// Flat search-result card, the shape both the index path and the
/// fallback path are translated into.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkshopCard {
    pub id: String,
    pub provider_id: String,
    pub title: String,
    pub provider_title: String,
    pub min_age: u32,
    pub max_age: u32,
    pub price: f64,
    pub available_seats: u32,
    pub rating: f64,
}

impl WorkshopCard {
    pub fn from_workshop(workshop: &Workshop) -> Self {
        Self {
            id: workshop.id.clone(),
            provider_id: workshop.provider_id.clone(),
            title: workshop.title.clone(),
            provider_title: workshop.provider_title.clone(),
            min_age: workshop.min_age,
            max_age: workshop.max_age,
            price: workshop.price,
            available_seats: workshop.available_seats,
            rating: workshop.rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_round_trip() {
        assert_eq!(WorkshopStatus::Active.as_db_str(), "ACTIVE");
        assert_eq!(WorkshopStatus::SoftDeleted.as_db_str(), "SOFT_DELETED");

        assert_eq!(
            WorkshopStatus::from_db_str("ACTIVE"),
            Some(WorkshopStatus::Active)
        );
        assert_eq!(
            WorkshopStatus::from_db_str("SOFT_DELETED"),
            Some(WorkshopStatus::SoftDeleted)
        );
        assert_eq!(WorkshopStatus::from_db_str("whatever"), None);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&WorkshopStatus::SoftDeleted).unwrap();
        assert_eq!(json, "\"SOFT_DELETED\"");

        let back: WorkshopStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WorkshopStatus::SoftDeleted);
    }

    #[test]
    fn test_new_workshop_defaults() {
        let workshop = Workshop::new("provider-1", "Pottery for kids");

        assert!(!workshop.id.is_empty());
        assert_eq!(workshop.provider_id, "provider-1");
        assert_eq!(workshop.title, "Pottery for kids");
        assert_eq!(workshop.status, WorkshopStatus::Active);
        assert!(workshop.is_active());
        assert_eq!(workshop.taken_seats, 0);
    }

    #[test]
    fn test_new_workshops_get_distinct_ids() {
        let a = Workshop::new("p", "a");
        let b = Workshop::new("p", "b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_seats_valid_for_update() {
        let workshop = Workshop::new("p", "t").with_seats(10, 4);

        assert!(workshop.seats_valid_for_update(4));
        assert!(workshop.seats_valid_for_update(20));
        assert!(!workshop.seats_valid_for_update(3));
        assert!(!workshop.seats_valid_for_update(0));
    }

    #[test]
    fn test_card_from_workshop() {
        let workshop = Workshop::new("provider-1", "Chess club")
            .with_provider_title("Chess Academy")
            .with_age_range(6, 14)
            .with_price(120.0)
            .with_seats(20, 5)
            .with_rating(4.5);

        let card = WorkshopCard::from_workshop(&workshop);

        assert_eq!(card.id, workshop.id);
        assert_eq!(card.title, "Chess club");
        assert_eq!(card.provider_title, "Chess Academy");
        assert_eq!(card.min_age, 6);
        assert_eq!(card.max_age, 14);
        assert_eq!(card.price, 120.0);
        assert_eq!(card.available_seats, 20);
        assert_eq!(card.rating, 4.5);
    }
}
