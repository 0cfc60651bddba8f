//! Personalized recommendations.
//!
//! A guest's preferences come from their profile, and a personalization score
//! is derived from their last few feedback entries. Every catalog item gets
//!
//! ```text
//! score = rating / 5
//!       + 0.3 if the item matches the guest's cuisine or activity level
//!       + 0.2 if the item's price tier equals the guest's budget tier
//! score = min(1, score * (0.5 + personalization))
//! ```
//!
//! and the top three of each catalog are returned. Room services are listed
//! unscored.

use crate::core::catalog::{
    ACTIVITIES, AMENITIES, Activity, Amenity, CatalogItem, DINING, DiningVenue, ROOM_SERVICES,
    RoomService,
};
use crate::core::error::{CoreError, CoreResult};
use crate::core::sentiment::{SentimentClassifier, SentimentLabel};
use crate::core::traits::RecommendationService;
use crate::infrastructure::entities::{GuestProfile, User};
use crate::infrastructure::traits::{FeedbackRepository, GuestProfileRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use di::{Ref, inject, injectable};
use log::{debug, error, info};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub const DEFAULT_PERSONALIZATION: f64 = 0.5;
const HISTORY_WINDOW: usize = 5;
const TOP_N: usize = 3;
const PREFERENCE_BONUS: f64 = 0.3;
const BUDGET_BONUS: f64 = 0.2;

const DEFAULT_CUISINE: &str = "international";
const DEFAULT_ACTIVITY_LEVEL: &str = "moderate";
const DEFAULT_BUDGET_TIER: &str = "standard";
const UNKNOWN_GUEST_ID: &str = "unknown";
const DEFAULT_GUEST_NAME: &str = "Valued Guest";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preferences {
    pub cuisine: String,
    pub activity_level: String,
    pub budget_tier: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            cuisine: DEFAULT_CUISINE.to_owned(),
            activity_level: DEFAULT_ACTIVITY_LEVEL.to_owned(),
            budget_tier: DEFAULT_BUDGET_TIER.to_owned(),
        }
    }
}

fn or_default(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_owned()
}

impl Preferences {
    /// Cuisine and activity level are taken as stored. Only the budget tier,
    /// which is the loyalty tier, is lower-cased.
    pub fn from_profile(profile: &GuestProfile) -> Preferences {
        let tier = profile.loyalty_tier.trim();
        Preferences {
            cuisine: or_default(profile.preferences.cuisine.as_deref(), DEFAULT_CUISINE),
            activity_level: or_default(
                profile.preferences.activity_level.as_deref(),
                DEFAULT_ACTIVITY_LEVEL,
            ),
            budget_tier: if tier.is_empty() {
                DEFAULT_BUDGET_TIER.to_owned()
            } else {
                tier.to_lowercase()
            },
        }
    }
}

/// `(mean rating / 5 + share of positive entries) / 2`, or 0.5 without
/// history.
pub fn personalization_score(history: &[(u8, SentimentLabel)]) -> f64 {
    if history.is_empty() {
        return DEFAULT_PERSONALIZATION;
    }

    let count = history.len() as f64;
    let mean_rating = history.iter().map(|(r, _)| f64::from(*r)).sum::<f64>() / count;
    let positive = history
        .iter()
        .filter(|(_, s)| *s == SentimentLabel::Positive)
        .count() as f64;

    (mean_rating / 5.0 + positive / count) / 2.0
}

pub fn score_item<T: CatalogItem>(item: &T, preferences: &Preferences, personalization: f64) -> f64 {
    let mut score = item.rating() / 5.0;
    if item.matches_preference(preferences) {
        score += PREFERENCE_BONUS;
    }
    if item.price_tier() == preferences.budget_tier {
        score += BUDGET_BONUS;
    }
    (score * (0.5 + personalization)).min(1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_score: Option<f64>,
}

/// Top three by score. Equal scores keep catalog order.
pub fn rank<T: CatalogItem>(
    items: &[T],
    preferences: &Preferences,
    personalization: f64,
) -> Vec<Recommendation<T>> {
    let mut scored: Vec<(f64, &T)> = items
        .iter()
        .map(|item| (score_item(item, preferences, personalization), item))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(TOP_N)
        .map(|(score, item)| Recommendation {
            item: item.clone(),
            recommendation_score: Some(score),
        })
        .collect()
}

fn unscored<T: Clone>(items: &[T]) -> Vec<Recommendation<T>> {
    items
        .iter()
        .map(|item| Recommendation {
            item: item.clone(),
            recommendation_score: None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationBundle {
    pub guest_id: String,
    pub guest_name: String,
    pub dining: Vec<Recommendation<DiningVenue>>,
    pub amenities: Vec<Recommendation<Amenity>>,
    pub activities: Vec<Recommendation<Activity>>,
    pub room_services: Vec<RoomService>,
    pub generated_at: DateTime<Utc>,
    pub personalization_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl RecommendationBundle {
    /// One representative item per catalog, for guests without a profile.
    pub fn default_bundle() -> RecommendationBundle {
        RecommendationBundle {
            guest_id: UNKNOWN_GUEST_ID.to_owned(),
            guest_name: DEFAULT_GUEST_NAME.to_owned(),
            dining: unscored(&DINING[1..2]),
            amenities: unscored(&AMENITIES[1..2]),
            activities: unscored(&ACTIVITIES[..1]),
            room_services: ROOM_SERVICES[..1].to_vec(),
            generated_at: Utc::now(),
            personalization_score: DEFAULT_PERSONALIZATION,
            preferences: None,
        }
    }

    pub fn personalized(
        profile: &GuestProfile,
        preferences: Preferences,
        personalization: f64,
    ) -> RecommendationBundle {
        RecommendationBundle {
            guest_id: profile.guest_id.clone(),
            guest_name: profile.display_name.clone(),
            dining: rank(DINING, &preferences, personalization),
            amenities: rank(AMENITIES, &preferences, personalization),
            activities: rank(ACTIVITIES, &preferences, personalization),
            room_services: ROOM_SERVICES.to_vec(),
            generated_at: Utc::now(),
            personalization_score: personalization,
            preferences: Some(preferences),
        }
    }
}

/// Which guest a recommendation request is for. Guests may only ask for
/// themselves; staff may ask for anyone.
pub fn resolve_target(user: &User, requested: Option<&str>) -> CoreResult<String> {
    match requested.map(str::trim).filter(|id| !id.is_empty()) {
        None => Ok(user.user_id.clone()),
        Some(id) if id == user.user_id || user.role.is_staff() => Ok(id.to_owned()),
        Some(_) => Err(CoreError::Forbidden("staff")),
    }
}

pub struct PersonalizedRecommendationService {
    profiles: Ref<dyn GuestProfileRepository>,
    feedback: Ref<dyn FeedbackRepository>,
    classifier: SentimentClassifier,
    latest: RwLock<HashMap<String, RecommendationBundle>>,
}

#[injectable(RecommendationService)]
impl PersonalizedRecommendationService {
    #[inject]
    pub fn create(
        profiles: Ref<dyn GuestProfileRepository>,
        feedback: Ref<dyn FeedbackRepository>,
    ) -> PersonalizedRecommendationService {
        PersonalizedRecommendationService {
            profiles,
            feedback,
            classifier: SentimentClassifier::default(),
            latest: RwLock::new(HashMap::new()),
        }
    }
}

impl PersonalizedRecommendationService {
    async fn build(&self, guest_id: &str) -> CoreResult<Option<RecommendationBundle>> {
        let Some(profile) = self.profiles.get(guest_id).await? else {
            return Ok(None);
        };
        let preferences = Preferences::from_profile(&profile);

        let mut recent = self.feedback.list_by_guest(guest_id).await?;
        recent.truncate(HISTORY_WINDOW);
        recent.reverse();

        let history: Vec<(u8, SentimentLabel)> = recent
            .iter()
            .map(|r| (r.rating, self.classifier.classify(&r.comment).sentiment))
            .collect();
        let personalization = personalization_score(&history);
        debug!(
            "guest {guest_id}: {} history entries, personalization {personalization:.2}",
            history.len()
        );

        Ok(Some(RecommendationBundle::personalized(
            &profile,
            preferences,
            personalization,
        )))
    }
}

#[async_trait]
impl RecommendationService for PersonalizedRecommendationService {
    async fn personalized(&self, guest_id: &str) -> RecommendationBundle {
        match self.build(guest_id).await {
            Ok(Some(bundle)) => {
                self.latest
                    .write()
                    .await
                    .insert(guest_id.to_owned(), bundle.clone());
                bundle
            }
            Ok(None) => {
                info!("no profile for guest {guest_id}, using default recommendations");
                RecommendationBundle::default_bundle()
            }
            Err(e) => {
                error!("recommendations for guest {guest_id} failed: {e}");
                RecommendationBundle::default_bundle()
            }
        }
    }

    fn default_bundle(&self) -> RecommendationBundle {
        RecommendationBundle::default_bundle()
    }

    async fn latest(&self, guest_id: &str) -> Option<RecommendationBundle> {
        self.latest.read().await.get(guest_id).cloned()
    }

    async fn profile(&self, guest_id: &str) -> CoreResult<Option<GuestProfile>> {
        Ok(self.profiles.get(guest_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::generate_id;
    use crate::core::sentiment::classify;
    use crate::core::testing::{MemoryFeedbackRepository, MemoryProfileRepository};
    use crate::infrastructure::entities::{
        FeedbackCategory, FeedbackRecord, FeedbackStatus, GuestPreferences, Role,
    };

    const EPSILON: f64 = 1e-9;

    fn profile(cuisine: Option<&str>, tier: &str) -> GuestProfile {
        GuestProfile {
            guest_id: "guest_001".to_owned(),
            display_name: "Ada Lovelace".to_owned(),
            loyalty_tier: tier.to_owned(),
            preferences: GuestPreferences {
                cuisine: cuisine.map(str::to_owned),
                activity_level: None,
            },
        }
    }

    fn feedback(rating: u8, comment: &str) -> FeedbackRecord {
        FeedbackRecord {
            feedback_id: generate_id("FB", Utc::now()),
            guest_id: "guest_001".to_owned(),
            guest_name: "Ada Lovelace".to_owned(),
            rating,
            category: FeedbackCategory::General,
            subject: "Stay".to_owned(),
            comment: comment.to_owned(),
            location: None,
            staff_member: None,
            anonymous: false,
            sentiment: classify(comment),
            submitted_at: Utc::now(),
            status: FeedbackStatus::New,
        }
    }

    fn service() -> (
        PersonalizedRecommendationService,
        Ref<MemoryProfileRepository>,
        Ref<MemoryFeedbackRepository>,
    ) {
        let profiles = Ref::new(MemoryProfileRepository::default());
        let feedback = Ref::new(MemoryFeedbackRepository::default());
        let service = PersonalizedRecommendationService::create(profiles.clone(), feedback.clone());
        (service, profiles, feedback)
    }

    fn names<T: CatalogItem>(items: &[Recommendation<T>], name: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|r| name(&r.item).to_owned()).collect()
    }

    #[test]
    fn test_preferences_defaults() {
        let prefs = Preferences::from_profile(&profile(None, "  "));
        assert_eq!(prefs, Preferences::default());

        let prefs = Preferences::from_profile(&profile(Some("asian"), "Premium"));
        assert_eq!(prefs.cuisine, "asian");
        assert_eq!(prefs.budget_tier, "premium");
        assert_eq!(prefs.activity_level, "moderate");
    }

    #[test]
    fn test_preferences_keep_stored_case() {
        let mut stored = profile(Some("Asian"), "Gold");
        stored.preferences.activity_level = Some("LOW".to_owned());
        let prefs = Preferences::from_profile(&stored);

        assert_eq!(prefs.cuisine, "Asian");
        assert_eq!(prefs.activity_level, "LOW");
        assert_eq!(prefs.budget_tier, "gold");

        // "Asian" is not the catalog's "asian": Spice Route gets no bonus
        assert!((score_item(&DINING[2], &prefs, 0.0) - 0.46).abs() < EPSILON);
    }

    #[test]
    fn test_personalization_score() {
        assert_eq!(personalization_score(&[]), DEFAULT_PERSONALIZATION);

        let history = [(5, SentimentLabel::Positive), (1, SentimentLabel::Negative)];
        assert!((personalization_score(&history) - 0.55).abs() < EPSILON);

        let history = [(5, SentimentLabel::Positive); 3];
        assert!((personalization_score(&history) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_item_scores() {
        let prefs = Preferences {
            cuisine: "asian".to_owned(),
            ..Preferences::default()
        };

        // Skyline: 4.8/5, no bonus
        assert!((score_item(&DINING[0], &prefs, 0.5) - 0.96).abs() < EPSILON);
        // Local Harvest at low personalization: 0.86 * 0.5
        assert!((score_item(&DINING[3], &prefs, 0.0) - 0.43).abs() < EPSILON);
        // Spice Route: both bonuses, capped
        assert_eq!(score_item(&DINING[2], &prefs, 0.5), 1.0);
        // amenities never get the preference bonus
        assert!((score_item(&AMENITIES[3], &prefs, 0.5) - 0.92).abs() < EPSILON);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let prefs = Preferences {
            cuisine: "asian".to_owned(),
            ..Preferences::default()
        };
        let ranked = rank(DINING, &prefs, 0.5);

        assert_eq!(ranked.len(), 3);
        // Garden Bistro and Spice Route both cap at 1.0; catalog order wins
        assert_eq!(
            names(&ranked, |d| d.name),
            ["Garden Bistro", "Spice Route", "Skyline Rooftop Restaurant"]
        );
    }

    #[test]
    fn test_activity_preference_bonus() {
        let prefs = Preferences {
            activity_level: "low".to_owned(),
            budget_tier: "premium".to_owned(),
            ..Preferences::default()
        };
        let ranked = rank(ACTIVITIES, &prefs, 0.0);
        assert_eq!(
            names(&ranked, |a| a.name),
            ["Wine Tasting Tour", "Cooking Class Experience", "Adventure Sports Package"]
        );
    }

    #[tokio::test]
    async fn test_unknown_guest_gets_default_bundle() {
        let (service, _, _) = service();
        let bundle = service.personalized("guest_999").await;

        assert_eq!(bundle.guest_id, "unknown");
        assert_eq!(bundle.guest_name, "Valued Guest");
        assert_eq!(bundle.personalization_score, DEFAULT_PERSONALIZATION);
        assert_eq!(bundle.dining.len(), 1);
        assert_eq!(bundle.amenities.len(), 1);
        assert_eq!(bundle.activities.len(), 1);
        assert_eq!(bundle.room_services.len(), 1);
        assert!(bundle.dining[0].recommendation_score.is_none());
        assert!(service.latest("guest_999").await.is_none());
    }

    #[tokio::test]
    async fn test_personalized_bundle_is_idempotent_and_memoized() {
        let (service, profiles, store) = service();
        profiles.insert(profile(Some("asian"), "Standard"));
        store.insert(feedback(4, "great room"));

        assert!(service.latest("guest_001").await.is_none());

        let first = service.personalized("guest_001").await;
        let second = service.personalized("guest_001").await;

        assert_eq!(first.guest_name, "Ada Lovelace");
        assert_eq!(first.room_services.len(), 3);
        assert_eq!(first.dining, second.dining);
        assert_eq!(first.amenities, second.amenities);
        assert_eq!(first.activities, second.activities);
        assert_eq!(first.personalization_score, second.personalization_score);

        let latest = service.latest("guest_001").await.unwrap();
        assert_eq!(latest, second);
    }

    #[tokio::test]
    async fn test_only_recent_history_counts() {
        let (service, profiles, store) = service();
        profiles.insert(profile(None, "Standard"));

        store.insert(feedback(1, "terrible"));
        for _ in 0..HISTORY_WINDOW {
            store.insert(feedback(5, "excellent"));
        }

        let bundle = service.personalized("guest_001").await;
        assert!((bundle.personalization_score - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_resolve_target() {
        let mut user = User {
            user_id: "guest_001".to_owned(),
            username: "ada".to_owned(),
            role: Role::Guest,
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: String::new(),
            loyalty_tier: "Standard".to_owned(),
            is_active: true,
            created_at: Utc::now(),
        };

        assert_eq!(resolve_target(&user, None).unwrap(), "guest_001");
        assert_eq!(resolve_target(&user, Some("")).unwrap(), "guest_001");
        assert_eq!(resolve_target(&user, Some("guest_001")).unwrap(), "guest_001");
        assert!(matches!(
            resolve_target(&user, Some("guest_002")),
            Err(CoreError::Forbidden(_))
        ));

        user.role = Role::Staff;
        assert_eq!(resolve_target(&user, Some("guest_002")).unwrap(), "guest_002");
    }
}
