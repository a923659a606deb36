//! Local Visibility Score.
//!
//! Combines four metric categories into a 0-100 score:
//! profile strength (40%), review performance (30%), local SEO (20%) and
//! engagement (10%). Each category is rounded to an integer before the
//! weighted total is rounded again.

use crate::models::*;

const GMB_WEIGHT: f64 = 0.4;
const REVIEW_WEIGHT: f64 = 0.3;
const SEO_WEIGHT: f64 = 0.2;
const ENGAGEMENT_WEIGHT: f64 = 0.1;

const MAX_RECOMMENDATIONS: usize = 5;
const MIN_CLICK_THROUGH_PERCENT: f64 = 3.0;

/// Calculate the overall Local Visibility Score
pub fn calculate_score(input: &VisibilityScoreInput) -> VisibilityScoreBreakdown {
    let gmb_score = gmb_score(&input.gmb);
    let review_score = review_score(&input.reviews);
    let seo_score = seo_score(&input.local_seo);
    let engagement_score = engagement_score(&input.engagement);

    let weighted = gmb_score as f64 * GMB_WEIGHT
        + review_score as f64 * REVIEW_WEIGHT
        + seo_score as f64 * SEO_WEIGHT
        + engagement_score as f64 * ENGAGEMENT_WEIGHT;
    let total_score = to_score(weighted);

    log::debug!(
        "visibility score {} (gmb {}, reviews {}, seo {}, engagement {})",
        total_score,
        gmb_score,
        review_score,
        seo_score,
        engagement_score
    );

    VisibilityScoreBreakdown {
        total_score,
        gmb_score,
        review_score,
        seo_score,
        engagement_score,
        breakdown: ScoreBreakdown {
            gmb: CategoryScore { score: gmb_score, details: gmb_details(&input.gmb) },
            reviews: CategoryScore { score: review_score, details: review_details(&input.reviews) },
            seo: CategoryScore { score: seo_score, details: seo_details(&input.local_seo) },
            engagement: CategoryScore {
                score: engagement_score,
                details: engagement_details(&input.engagement),
            },
        },
        recommendations: recommendations(input),
    }
}

/// `value / target`, clamped to [0, 1]. Non-finite ratios count as zero.
fn ratio(value: f64, target: f64) -> f64 {
    let r = value / target;
    if r.is_finite() {
        r.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn to_score(raw: f64) -> u8 {
    if raw.is_finite() {
        raw.round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

// =====================
// Category scores
// =====================

fn gmb_score(gmb: &GmbMetrics) -> u8 {
    let completion = ratio(gmb.profile_completion, 100.0) * 30.0;
    let posts = ratio(gmb.posts_last_30_days as f64, 4.0) * 25.0;
    let photos = ratio(gmb.photos_count as f64, 10.0) * 25.0;
    let answers = ratio(gmb.questions_answered as f64, 10.0) * 20.0;

    to_score(completion + posts + photos + answers)
}

fn review_score(reviews: &ReviewMetrics) -> u8 {
    let rating = ratio(reviews.average_rating, 5.0) * 40.0;
    let volume = ratio(reviews.total_reviews as f64, 500.0) * 25.0;
    let recency = ratio(reviews.new_reviews_last_30_days as f64, 50.0) * 20.0;
    let responses = ratio(reviews.response_rate, 100.0) * 15.0;

    to_score(rating + volume + recency + responses)
}

fn seo_score(seo: &LocalSeoMetrics) -> u8 {
    let basics = [seo.has_title, seo.has_description, seo.has_h1, seo.has_schema];
    let present = basics.iter().filter(|&&b| b).count();
    let basic_score = present as f64 / basics.len() as f64 * 40.0;

    let image_score = ratio(seo.image_alt_tags_coverage, 100.0) * 30.0;

    // Rank 1 earns the full 30 points, rank 10 and beyond earn nothing
    let keyword_score = match average_rank(&seo.local_keyword_rankings) {
        Some(avg_rank) => ratio(10.0 - avg_rank, 9.0) * 30.0,
        None => 0.0,
    };

    to_score(basic_score + image_score + keyword_score)
}

fn engagement_score(engagement: &EngagementMetrics) -> u8 {
    let clicks = ratio(engagement.website_clicks as f64, 1000.0) * 40.0;
    let calls = ratio(engagement.phone_calls as f64, 500.0) * 30.0;
    let directions = ratio(engagement.direction_requests as f64, 200.0) * 20.0;
    let forms = ratio(engagement.form_submissions as f64, 100.0) * 10.0;

    to_score(clicks + calls + directions + forms)
}

fn average_rank(rankings: &[KeywordRanking]) -> Option<f64> {
    if rankings.is_empty() {
        return None;
    }
    let sum: f64 = rankings.iter().map(|kw| kw.rank as f64).sum();
    Some(sum / rankings.len() as f64)
}

// =====================
// Category details
// =====================

fn gmb_details(gmb: &GmbMetrics) -> Vec<String> {
    let mut details = Vec::new();

    if gmb.profile_completion < 100.0 {
        details.push(format!("Complete your GMB profile (currently {}%)", gmb.profile_completion));
    }
    if gmb.posts_last_30_days < 4 {
        details.push(format!("Post more frequently ({}/4 posts this month)", gmb.posts_last_30_days));
    }
    if gmb.photos_count < 10 {
        details.push(format!("Add more photos ({}/10 minimum)", gmb.photos_count));
    }
    if gmb.questions_answered < 10 {
        details.push(format!("Answer more customer questions ({}/10)", gmb.questions_answered));
    }

    details
}

fn review_details(reviews: &ReviewMetrics) -> Vec<String> {
    let mut details = Vec::new();

    if reviews.average_rating < 4.0 {
        details.push(format!(
            "Improve customer satisfaction (current rating: {:.1})",
            (reviews.average_rating * 10.0).round() / 10.0
        ));
    }
    if reviews.total_reviews < 100 {
        details.push(format!("Encourage more reviews ({}/100 minimum)", reviews.total_reviews));
    }
    if reviews.response_rate < 90.0 {
        details.push(format!("Respond to more reviews ({}% response rate)", reviews.response_rate));
    }
    if reviews.new_reviews_last_30_days < 10 {
        details.push(format!(
            "Generate more recent reviews ({} this month)",
            reviews.new_reviews_last_30_days
        ));
    }

    details
}

fn seo_details(seo: &LocalSeoMetrics) -> Vec<String> {
    let mut details = Vec::new();

    if !seo.has_title {
        details.push("Add a compelling page title".to_string());
    }
    if !seo.has_description {
        details.push("Add a meta description".to_string());
    }
    if !seo.has_h1 {
        details.push("Include an H1 heading".to_string());
    }
    if !seo.has_schema {
        details.push("Add structured data markup".to_string());
    }
    if seo.image_alt_tags_coverage < 90.0 {
        details.push(format!(
            "Optimize image alt tags ({}% coverage)",
            seo.image_alt_tags_coverage
        ));
    }

    let poor_rankings: Vec<&str> = seo
        .local_keyword_rankings
        .iter()
        .filter(|kw| kw.rank > 5)
        .take(3)
        .map(|kw| kw.keyword.as_str())
        .collect();
    if !poor_rankings.is_empty() {
        details.push(format!("Improve rankings for: {}", poor_rankings.join(", ")));
    }

    details
}

fn engagement_details(engagement: &EngagementMetrics) -> Vec<String> {
    let checks = [
        (engagement.website_clicks < 500, "Increase website clicks from GMB"),
        (engagement.phone_calls < 200, "Generate more phone call leads"),
        (engagement.direction_requests < 100, "Encourage more direction requests"),
        (engagement.form_submissions < 50, "Improve form submission conversion"),
    ];

    checks
        .iter()
        .filter(|(failing, _)| *failing)
        .map(|(_, detail)| detail.to_string())
        .collect()
}

// =====================
// Recommendations
// =====================

/// Click-through from impressions to website clicks, `None` without impressions
fn click_through_percent(input: &VisibilityScoreInput) -> Option<f64> {
    if input.gmb.impressions_last_30_days == 0 {
        return None;
    }
    Some(input.engagement.website_clicks as f64 / input.gmb.impressions_last_30_days as f64 * 100.0)
}

fn recommendations(input: &VisibilityScoreInput) -> Vec<String> {
    let low_click_through = click_through_percent(input)
        .map(|pct| pct < MIN_CLICK_THROUGH_PERCENT)
        .unwrap_or(false);

    let candidates = [
        (
            input.gmb.profile_completion < 100.0,
            "Complete your Google My Business profile to improve local visibility",
        ),
        (
            input.gmb.posts_last_30_days < 4,
            "Post at least 4 times per month to keep your GMB profile active",
        ),
        (
            input.reviews.response_rate < 90.0,
            "Respond to customer reviews within 24 hours to improve engagement",
        ),
        (
            input.reviews.average_rating < 4.0,
            "Focus on improving customer experience to boost ratings",
        ),
        (
            !input.local_seo.has_schema,
            "Add structured data markup to help search engines understand your business",
        ),
        (
            input.local_seo.image_alt_tags_coverage < 90.0,
            "Optimize image alt tags for better local SEO performance",
        ),
        (
            low_click_through,
            "Improve your GMB profile to increase click-through rates",
        ),
    ];

    candidates
        .iter()
        .filter(|(triggered, _)| *triggered)
        .take(MAX_RECOMMENDATIONS)
        .map(|(_, text)| text.to_string())
        .collect()
}
