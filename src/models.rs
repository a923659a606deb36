use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

// =====================
// Visibility score inputs
// =====================

/// Google Business Profile metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmbMetrics {
    /// 0-100
    pub profile_completion: f64,
    pub posts_last_30_days: u32,
    pub photos_count: u32,
    pub questions_answered: u32,
    pub impressions_last_30_days: u64,
    /// Click-through rate percentage
    pub ctr: f64,
}

/// Aggregated review health metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMetrics {
    /// 0.0-5.0
    pub average_rating: f64,
    pub total_reviews: u32,
    pub new_reviews_last_30_days: u32,
    /// 0-100
    pub response_rate: f64,
    /// Average response time in hours
    pub response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRanking {
    pub keyword: String,
    pub rank: u32,
}

/// On-site local SEO hygiene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSeoMetrics {
    pub has_title: bool,
    pub has_description: bool,
    pub has_h1: bool,
    pub has_schema: bool,
    /// 0-100
    pub image_alt_tags_coverage: f64,
    #[serde(default)]
    pub local_keywords: Vec<String>,
    #[serde(default)]
    pub local_keyword_rankings: Vec<KeywordRanking>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub website_clicks: u32,
    pub phone_calls: u32,
    pub direction_requests: u32,
    pub form_submissions: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityScoreInput {
    pub gmb: GmbMetrics,
    pub reviews: ReviewMetrics,
    #[serde(rename = "localSEO")]
    pub local_seo: LocalSeoMetrics,
    pub engagement: EngagementMetrics,
}

// =====================
// Visibility score output
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: u8,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub gmb: CategoryScore,
    pub reviews: CategoryScore,
    pub seo: CategoryScore,
    pub engagement: CategoryScore,
}

/// Complete Local Visibility Score report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityScoreBreakdown {
    pub total_score: u8,
    pub gmb_score: u8,
    pub review_score: u8,
    pub seo_score: u8,
    pub engagement_score: u8,
    pub breakdown: ScoreBreakdown,
    pub recommendations: Vec<String>,
}

// =====================
// Sentiment analysis
// =====================

/// A review as consumed by the sentiment analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: String,
    pub content: String,
    /// 1-5
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub store_name: String,
}

impl ReviewRecord {
    /// Boundary check for records arriving from outside the crate
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if (1..=5).contains(&self.rating) {
            Ok(())
        } else {
            Err(AnalyticsError::InvalidRating(self.rating))
        }
    }
}

/// Per-review sentiment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    /// -1 to 1 scale
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySentiment {
    pub month: String,
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    pub total_reviews: usize,
    pub average_rating: f64,
}

impl MonthlySentiment {
    /// Net sentiment used for ranking months and classifying trends
    pub fn net(&self) -> i64 {
        self.positive as i64 - self.negative as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentTrend {
    Improving,
    Declining,
    Stable,
}

/// Analysis window in whole months, always within 1-6
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TimelinePeriod(u8);

impl TimelinePeriod {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(months: u8) -> Result<Self, AnalyticsError> {
        if (Self::MIN..=Self::MAX).contains(&months) {
            Ok(Self(months))
        } else {
            Err(AnalyticsError::InvalidPeriod(months))
        }
    }

    pub fn months(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = TimelinePeriod> {
        (Self::MIN..=Self::MAX).map(TimelinePeriod)
    }
}

impl Default for TimelinePeriod {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<u8> for TimelinePeriod {
    type Error = AnalyticsError;

    fn try_from(months: u8) -> Result<Self, Self::Error> {
        Self::new(months)
    }
}

impl From<TimelinePeriod> for u8 {
    fn from(period: TimelinePeriod) -> Self {
        period.0
    }
}

/// Final sentiment report for a window of months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentTrends {
    pub monthly_data: Vec<MonthlySentiment>,
    pub overall_trend: SentimentTrend,
    pub key_insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub selected_period: TimelinePeriod,
}

/// Sentiment bar for chart widgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentChartPoint {
    pub month: String,
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    pub total: usize,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineOption {
    pub value: u8,
    pub label: String,
}

// =====================
// Persisted records
// =====================

/// Business location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i64,
    pub name: String,
    /// Chain or franchise the location belongs to, empty for independents
    pub brand: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStore {
    pub name: String,
    pub brand: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub description: String,
    pub category: String,
}

/// Review row joined with its store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReview {
    pub id: i64,
    pub store_id: i64,
    pub store_name: String,
    pub content: String,
    pub rating: u8,
    pub source: String,
    pub replied: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredReview> for ReviewRecord {
    fn from(review: &StoredReview) -> Self {
        ReviewRecord {
            id: review.id.to_string(),
            content: review.content.clone(),
            rating: review.rating,
            created_at: review.created_at,
            store_name: review.store_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub store_id: i64,
    pub content: String,
    pub rating: u8,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default = "default_review_source")]
    pub source: String,
    #[serde(default)]
    pub replied: bool,
}

fn default_review_source() -> String {
    "manual".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCount {
    pub rating: u8,
    pub count: i64,
}

/// Review summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_reviews: i64,
    pub average_rating: f64,
    pub rating_distribution: Vec<RatingCount>,
    pub replied_count: i64,
    pub response_rate: f64,
}

impl Default for ReviewStats {
    fn default() -> Self {
        Self {
            total_reviews: 0,
            average_rating: 0.0,
            rating_distribution: (1..=5).map(|rating| RatingCount { rating, count: 0 }).collect(),
            replied_count: 0,
            response_rate: 0.0,
        }
    }
}

/// Stored metric snapshot for one store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilitySnapshot {
    pub store_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub input: VisibilityScoreInput,
}
