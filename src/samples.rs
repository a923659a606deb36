//! Demo data shown when a store has nothing recorded yet.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};

use crate::models::*;

pub fn sample_visibility_input() -> VisibilityScoreInput {
    VisibilityScoreInput {
        gmb: GmbMetrics {
            profile_completion: 85.0,
            posts_last_30_days: 3,
            photos_count: 15,
            questions_answered: 8,
            impressions_last_30_days: 143_000,
            ctr: 3.6,
        },
        reviews: ReviewMetrics {
            average_rating: 4.25,
            total_reviews: 4,
            new_reviews_last_30_days: 15,
            response_rate: 90.0,
            response_time: 4.0,
        },
        local_seo: LocalSeoMetrics {
            has_title: true,
            has_description: true,
            has_h1: true,
            has_schema: true,
            image_alt_tags_coverage: 95.0,
            local_keywords: vec![
                "colive pg bangalore".to_string(),
                "student accommodation bangalore".to_string(),
                "pg near tech park".to_string(),
            ],
            local_keyword_rankings: vec![
                KeywordRanking { keyword: "colive pg bangalore".to_string(), rank: 2 },
                KeywordRanking { keyword: "student accommodation bangalore".to_string(), rank: 4 },
                KeywordRanking { keyword: "pg near tech park".to_string(), rank: 7 },
            ],
        },
        engagement: EngagementMetrics {
            website_clicks: 2345,
            phone_calls: 892,
            direction_requests: 156,
            form_submissions: 189,
        },
    }
}

const SAMPLE_REVIEWS: [(&str, u8, &str); 12] = [
    ("Colive 918 Cape Town", 5, "Excellent accommodation! Clean rooms, great food, and friendly staff. Highly recommend!"),
    ("Colive 918 Cape Town", 4, "Good place but could be better. Rooms are clean and food is decent. Some amenities could be improved."),
    ("Colive 1180 Columbus", 5, "Amazing place! Great location near tech parks, modern amenities, and very professional staff."),
    ("Colive 1180 Columbus", 3, "The place is okay but the food quality has gone down recently. Staff is helpful though."),
    ("Colive 918 Cape Town", 2, "Terrible experience! Dirty rooms and unprofessional staff. Would not recommend."),
    ("Colive 1180 Columbus", 5, "Wonderful stay! Everything exceeded expectations. Clean, comfortable, and great value."),
    ("Colive 918 Cape Town", 3, "Average experience. Nothing special but not bad either. Decent for the price."),
    ("Colive 1180 Columbus", 5, "Fantastic service! The staff went above and beyond to make our stay comfortable."),
    ("Colive 918 Cape Town", 4, "Great improvement! Much better than before. Clean facilities and friendly atmosphere."),
    ("Colive 1180 Columbus", 5, "Outstanding experience! Best accommodation we've stayed at. Highly recommend!"),
    ("Colive 918 Cape Town", 5, "Excellent value for money. Clean rooms, good location, and helpful staff."),
    ("Colive 1180 Columbus", 5, "Superb service and facilities. Couldn't ask for more. Will definitely return!"),
];

/// Twelve reviews, two per month, covering the six months up to `now`
pub fn sample_reviews(now: DateTime<Utc>) -> Vec<ReviewRecord> {
    let Some(this_month) = NaiveDate::from_ymd_opt(now.year(), now.month(), 1) else {
        return Vec::new();
    };

    SAMPLE_REVIEWS
        .iter()
        .enumerate()
        .filter_map(|(i, (store, rating, content))| {
            let months_back = 5 - (i / 2) as u32;
            let day_offset = if i % 2 == 0 { 4 } else { 14 };
            let date = this_month
                .checked_sub_months(Months::new(months_back))?
                .checked_add_days(Days::new(day_offset))?;

            Some(ReviewRecord {
                id: (i + 1).to_string(),
                content: content.to_string(),
                rating: *rating,
                created_at: date.and_hms_opt(10, 0, 0)?.and_utc(),
                store_name: store.to_string(),
            })
        })
        .collect()
}
