//! Static resort catalog used by the recommendation scorer.

use crate::core::recommendations::Preferences;
use serde::Serialize;

/// Something the scorer can rank.
pub trait CatalogItem: Clone + Serialize + Send + Sync {
    fn rating(&self) -> f64;

    fn price_tier(&self) -> &str;

    /// Whether the item matches the guest's category preference
    /// (cuisine, activity level). Items without such a preference never do.
    fn matches_preference(&self, _preferences: &Preferences) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiningVenue {
    pub id: &'static str,
    pub name: &'static str,
    pub cuisine: &'static str,
    pub price_tier: &'static str,
    pub rating: f64,
    pub description: &'static str,
    pub image: &'static str,
    pub specialties: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Amenity {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub price_tier: &'static str,
    pub rating: f64,
    pub description: &'static str,
    pub image: &'static str,
    pub services: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub activity_level: &'static str,
    pub price_tier: &'static str,
    pub duration: &'static str,
    pub rating: f64,
    pub description: &'static str,
    pub image: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomService {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub available: &'static str,
}

impl CatalogItem for DiningVenue {
    fn rating(&self) -> f64 {
        self.rating
    }

    fn price_tier(&self) -> &str {
        self.price_tier
    }

    fn matches_preference(&self, preferences: &Preferences) -> bool {
        self.cuisine == preferences.cuisine
    }
}

impl CatalogItem for Amenity {
    fn rating(&self) -> f64 {
        self.rating
    }

    fn price_tier(&self) -> &str {
        self.price_tier
    }
}

impl CatalogItem for Activity {
    fn rating(&self) -> f64 {
        self.rating
    }

    fn price_tier(&self) -> &str {
        self.price_tier
    }

    fn matches_preference(&self, preferences: &Preferences) -> bool {
        self.activity_level == preferences.activity_level
    }
}

pub static DINING: &[DiningVenue] = &[
    DiningVenue {
        id: "dining_skyline",
        name: "Skyline Rooftop Restaurant",
        cuisine: "international",
        price_tier: "premium",
        rating: 4.8,
        description: "Exquisite fine dining with panoramic city views",
        image: "/static/images/dining/skyline.jpg",
        specialties: &["Wagyu Beef", "Fresh Seafood", "Craft Cocktails"],
    },
    DiningVenue {
        id: "dining_garden",
        name: "Garden Bistro",
        cuisine: "mediterranean",
        price_tier: "standard",
        rating: 4.5,
        description: "Fresh Mediterranean cuisine in a garden setting",
        image: "/static/images/dining/garden.jpg",
        specialties: &["Fresh Salads", "Grilled Fish", "Organic Vegetables"],
    },
    DiningVenue {
        id: "dining_spice",
        name: "Spice Route",
        cuisine: "asian",
        price_tier: "standard",
        rating: 4.6,
        description: "Authentic Asian flavors with modern presentation",
        image: "/static/images/dining/spice.jpg",
        specialties: &["Dim Sum", "Curry Dishes", "Sushi"],
    },
    DiningVenue {
        id: "dining_harvest",
        name: "Local Harvest",
        cuisine: "local",
        price_tier: "budget",
        rating: 4.3,
        description: "Farm-to-table local cuisine with seasonal ingredients",
        image: "/static/images/dining/harvest.jpg",
        specialties: &["Seasonal Menu", "Local Ingredients", "Comfort Food"],
    },
];

pub static AMENITIES: &[Amenity] = &[
    Amenity {
        id: "amenity_spa",
        name: "Luxury Spa & Wellness Center",
        category: "wellness",
        price_tier: "premium",
        rating: 4.9,
        description: "Full-service spa with massage, facials, and wellness treatments",
        image: "/static/images/amenities/spa.jpg",
        services: &["Hot Stone Massage", "Aromatherapy", "Yoga Classes"],
    },
    Amenity {
        id: "amenity_fitness",
        name: "Fitness Center & Pool",
        category: "fitness",
        price_tier: "standard",
        rating: 4.4,
        description: "State-of-the-art gym with Olympic-size pool",
        image: "/static/images/amenities/fitness.jpg",
        services: &["24/7 Gym Access", "Personal Training", "Swimming Pool"],
    },
    Amenity {
        id: "amenity_business",
        name: "Business Center",
        category: "business",
        price_tier: "standard",
        rating: 4.2,
        description: "Fully equipped business center with meeting rooms",
        image: "/static/images/amenities/business.jpg",
        services: &["Meeting Rooms", "High-Speed Internet", "Printing Services"],
    },
    Amenity {
        id: "amenity_kids",
        name: "Kids Club",
        category: "family",
        price_tier: "budget",
        rating: 4.6,
        description: "Supervised activities and entertainment for children",
        image: "/static/images/amenities/kids.jpg",
        services: &["Supervised Play", "Arts & Crafts", "Movie Nights"],
    },
];

pub static ACTIVITIES: &[Activity] = &[
    Activity {
        id: "activity_walking",
        name: "City Walking Tour",
        category: "cultural",
        activity_level: "moderate",
        price_tier: "budget",
        duration: "3 hours",
        rating: 4.7,
        description: "Guided tour of historic city landmarks and hidden gems",
        image: "/static/images/activities/walking.jpg",
    },
    Activity {
        id: "activity_adventure",
        name: "Adventure Sports Package",
        category: "adventure",
        activity_level: "high",
        price_tier: "premium",
        duration: "Full day",
        rating: 4.8,
        description: "Thrilling outdoor activities including zip-lining and rock climbing",
        image: "/static/images/activities/adventure.jpg",
    },
    Activity {
        id: "activity_cooking",
        name: "Cooking Class Experience",
        category: "culinary",
        activity_level: "low",
        price_tier: "standard",
        duration: "4 hours",
        rating: 4.5,
        description: "Learn to cook local dishes with professional chefs",
        image: "/static/images/activities/cooking.jpg",
    },
    Activity {
        id: "activity_wine",
        name: "Wine Tasting Tour",
        category: "leisure",
        activity_level: "low",
        price_tier: "premium",
        duration: "5 hours",
        rating: 4.6,
        description: "Visit local wineries and taste premium wines",
        image: "/static/images/activities/wine.jpg",
    },
];

pub static ROOM_SERVICES: &[RoomService] = &[
    RoomService {
        id: "service_concierge",
        name: "24/7 Concierge Service",
        category: "concierge",
        description: "Personal assistance with reservations, tickets, and local information",
        available: "24/7",
    },
    RoomService {
        id: "service_dining",
        name: "In-Room Dining",
        category: "dining",
        description: "Gourmet meals delivered to your room",
        available: "6:00 AM - 11:00 PM",
    },
    RoomService {
        id: "service_laundry",
        name: "Laundry & Dry Cleaning",
        category: "housekeeping",
        description: "Professional laundry and dry cleaning services",
        available: "8:00 AM - 6:00 PM",
    },
];
