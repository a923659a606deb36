//! Review sentiment trends.
//!
//! Each review gets a lexicon-based sentiment distribution, reviews are
//! bucketed by calendar month, and the monthly series is classified as
//! improving, declining or stable with insights for the dashboard.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::models::*;

const POSITIVE_WORDS: &[&str] = &[
    "excellent", "amazing", "great", "good", "wonderful", "fantastic", "outstanding",
    "perfect", "brilliant", "superb", "terrific", "awesome", "fabulous", "incredible",
    "love", "enjoy", "satisfied", "happy", "pleased", "delighted", "impressed",
    "clean", "comfortable", "convenient", "affordable", "friendly", "helpful",
    "professional", "efficient", "reliable", "trustworthy", "quality", "value",
    "recommend", "best", "top", "exceeded", "surpassed", "wow", "stunning",
];

const NEGATIVE_WORDS: &[&str] = &[
    "terrible", "awful", "horrible", "bad", "poor", "disappointing", "frustrating",
    "annoying", "upset", "angry", "disgusted", "hate", "worst", "useless",
    "dirty", "uncomfortable", "expensive", "rude", "unhelpful", "unprofessional",
    "slow", "unreliable", "untrustworthy", "cheap", "broken", "damaged",
    "noisy", "crowded", "messy", "smelly", "cold", "hot", "difficult",
    "complicated", "confusing", "waste", "regret", "avoid", "never",
];

const NEUTRAL_WORDS: &[&str] = &[
    "okay", "fine", "average", "decent", "acceptable", "reasonable", "standard",
    "normal", "usual", "typical", "moderate", "adequate", "sufficient",
];

const RATING_WEIGHT: f64 = 0.7;
const WORD_WEIGHT: f64 = 0.3;

/// Net-sentiment swing between halves that counts as a trend
const TREND_THRESHOLD: f64 = 10.0;
const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordClass {
    Positive,
    Negative,
    Neutral,
}

fn classify(word: &str) -> Option<WordClass> {
    if POSITIVE_WORDS.contains(&word) {
        Some(WordClass::Positive)
    } else if NEGATIVE_WORDS.contains(&word) {
        Some(WordClass::Negative)
    } else if NEUTRAL_WORDS.contains(&word) {
        Some(WordClass::Neutral)
    } else {
        None
    }
}

/// Whitespace tokens, lowercased, with everything but `[a-z0-9_]` removed
fn tokenize(content: &str) -> impl Iterator<Item = String> + '_ {
    content.split_whitespace().map(|token| {
        token
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect()
    })
}

fn percent(count: u32, total: u32) -> u32 {
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Analyze sentiment of a single review
pub fn analyze_review_sentiment(review: &ReviewRecord) -> SentimentScore {
    let (mut positive, mut negative, mut neutral) = (0u32, 0u32, 0u32);

    for word in tokenize(&review.content) {
        match classify(&word) {
            Some(WordClass::Positive) => positive += 1,
            Some(WordClass::Negative) => negative += 1,
            Some(WordClass::Neutral) => neutral += 1,
            None => {}
        }
    }

    let rating_sentiment = (review.rating as f64 - 3.0) / 2.0;
    let word_sentiment =
        (positive as f64 - negative as f64) / (positive + negative).max(1) as f64;
    let overall = (rating_sentiment * RATING_WEIGHT + word_sentiment * WORD_WEIGHT).clamp(-1.0, 1.0);

    let total = positive + negative + neutral;
    if total == 0 {
        return SentimentScore { positive: 0, negative: 0, neutral: 100, overall };
    }

    SentimentScore {
        positive: percent(positive, total),
        negative: percent(negative, total),
        neutral: percent(neutral, total),
        overall,
    }
}

/// Analyze sentiment trends over the last `period` months, as of now
pub fn analyze_sentiment_trends(reviews: &[ReviewRecord], period: TimelinePeriod) -> SentimentTrends {
    analyze_sentiment_trends_at(reviews, period, Utc::now())
}

/// Same as [`analyze_sentiment_trends`] with an explicit clock
pub fn analyze_sentiment_trends_at(
    reviews: &[ReviewRecord],
    period: TimelinePeriod,
    now: DateTime<Utc>,
) -> SentimentTrends {
    let cutoff = period_start(now, period);

    let in_window: Vec<&ReviewRecord> = reviews.iter().filter(|r| r.created_at >= cutoff).collect();
    log::debug!(
        "{} of {} reviews fall within the last {} month(s)",
        in_window.len(),
        reviews.len(),
        period.months()
    );

    let monthly_data = monthly_sentiment(&in_window);
    let overall_trend = determine_overall_trend(&monthly_data);
    let key_insights = key_insights(&monthly_data, period);
    let recommendations = recommendations(&monthly_data, overall_trend, period);

    SentimentTrends {
        monthly_data,
        overall_trend,
        key_insights,
        recommendations,
        selected_period: period,
    }
}

/// `now` with its month field moved back by `period` months.
///
/// Days past the end of the target month spill into the following month,
/// so 31 May minus 3 months is 2 March, not 29 February.
fn period_start(now: DateTime<Utc>, period: TimelinePeriod) -> DateTime<Utc> {
    let months = now.year() * 12 + now.month0() as i32 - period.months() as i32;
    let (year, month0) = (months.div_euclid(12), months.rem_euclid(12) as u32);

    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .and_then(|first| first.checked_add_days(Days::new(now.day0() as u64)))
        .map(|date| date.and_time(now.time()).and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Bucket reviews by calendar month, oldest first
fn monthly_sentiment(reviews: &[&ReviewRecord]) -> Vec<MonthlySentiment> {
    let mut groups: BTreeMap<(i32, u32), Vec<&ReviewRecord>> = BTreeMap::new();
    for &review in reviews {
        let key = (review.created_at.year(), review.created_at.month());
        groups.entry(key).or_default().push(review);
    }

    groups
        .into_values()
        .map(|group| {
            let count = group.len();
            let scores: Vec<SentimentScore> =
                group.iter().map(|r| analyze_review_sentiment(r)).collect();

            let mean = |f: fn(&SentimentScore) -> u32| -> u32 {
                let sum: u32 = scores.iter().map(f).sum();
                (sum as f64 / count as f64).round() as u32
            };
            let rating_sum: f64 = group.iter().map(|r| r.rating as f64).sum();

            MonthlySentiment {
                month: group[0].created_at.format("%b %Y").to_string(),
                positive: mean(|s| s.positive),
                negative: mean(|s| s.negative),
                neutral: mean(|s| s.neutral),
                total_reviews: count,
                average_rating: (rating_sum / count as f64 * 10.0).round() / 10.0,
            }
        })
        .collect()
}

fn mean_net(months: &[MonthlySentiment]) -> f64 {
    let sum: i64 = months.iter().map(MonthlySentiment::net).sum();
    sum as f64 / months.len() as f64
}

fn determine_overall_trend(monthly_data: &[MonthlySentiment]) -> SentimentTrend {
    if monthly_data.len() < 2 {
        return SentimentTrend::Stable;
    }

    let split = monthly_data.len().div_ceil(2);
    let (first_half, second_half) = monthly_data.split_at(split);
    let difference = mean_net(second_half) - mean_net(first_half);

    if difference > TREND_THRESHOLD {
        SentimentTrend::Improving
    } else if difference < -TREND_THRESHOLD {
        SentimentTrend::Declining
    } else {
        SentimentTrend::Stable
    }
}

fn key_insights(monthly_data: &[MonthlySentiment], period: TimelinePeriod) -> Vec<String> {
    let mut insights = Vec::new();

    let (Some(first), Some(last)) = (monthly_data.first(), monthly_data.last()) else {
        return insights;
    };

    if period.months() == 1 {
        insights.push("Analyzing sentiment for the last 1 month".to_string());
    } else {
        insights.push(format!(
            "Analyzing sentiment trends over the last {} months",
            period.months()
        ));
    }

    // Ties keep the earliest month
    let best = monthly_data
        .iter()
        .fold(first, |best, m| if m.net() > best.net() { m } else { best });
    let worst = monthly_data
        .iter()
        .fold(first, |worst, m| if m.net() < worst.net() { m } else { worst });

    insights.push(format!("Best sentiment month: {} ({}% positive)", best.month, best.positive));
    insights.push(format!("Challenging month: {} ({}% negative)", worst.month, worst.negative));

    let positive_sum: u32 = monthly_data.iter().map(|m| m.positive).sum();
    let mean_positive = positive_sum as f64 / monthly_data.len() as f64;
    if mean_positive > 70.0 {
        insights.push(format!(
            "Strong positive sentiment maintained ({}% average)",
            mean_positive.round()
        ));
    } else if mean_positive < 50.0 {
        insights.push(format!(
            "Need to improve positive sentiment ({}% average)",
            mean_positive.round()
        ));
    }

    let recent = &monthly_data[monthly_data.len().saturating_sub(3)..];
    if recent.len() >= 2 {
        let change = last.positive as i64 - recent[0].positive as i64;
        if change > 10 {
            insights.push("Recent improvement in sentiment trends".to_string());
        } else if change < -10 {
            insights.push("Recent decline in sentiment - immediate attention needed".to_string());
        }
    }

    insights
}

fn recommendations(
    monthly_data: &[MonthlySentiment],
    trend: SentimentTrend,
    period: TimelinePeriod,
) -> Vec<String> {
    let Some(latest) = monthly_data.last() else {
        return Vec::new();
    };

    let mut recommendations: Vec<&str> = Vec::new();

    recommendations.push(match period.months() {
        1 => "Monitor daily sentiment changes for immediate response opportunities",
        2..=3 => "Focus on short-term sentiment improvements and quick wins",
        _ => "Implement long-term strategies for sustained sentiment improvement",
    });

    if latest.negative > 30 {
        recommendations.push("Address negative feedback immediately to prevent sentiment decline");
    }
    if latest.positive < 60 {
        recommendations.push("Implement strategies to boost positive customer experiences");
    }

    match trend {
        SentimentTrend::Declining => {
            recommendations.push("Review recent changes that may have impacted customer satisfaction");
            recommendations.push("Increase proactive customer outreach and feedback collection");
        }
        SentimentTrend::Improving => {
            recommendations.push("Maintain current positive practices and customer service standards");
        }
        SentimentTrend::Stable => {}
    }

    if latest.total_reviews < 10 {
        recommendations.push("Encourage more customer reviews to get better sentiment insights");
    }

    recommendations.push("Respond to all reviews within 24 hours to show customer care");
    recommendations.push("Use negative feedback to identify and fix operational issues");

    recommendations
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(String::from)
        .collect()
}

/// Sentiment distribution for chart display
pub fn chart_data(monthly_data: &[MonthlySentiment]) -> Vec<SentimentChartPoint> {
    monthly_data
        .iter()
        .map(|m| SentimentChartPoint {
            month: m.month.clone(),
            positive: m.positive,
            negative: m.negative,
            neutral: m.neutral,
            total: m.total_reviews,
            average_rating: m.average_rating,
        })
        .collect()
}

/// Selectable analysis windows
pub fn timeline_options() -> Vec<TimelineOption> {
    TimelinePeriod::all()
        .map(|period| {
            let months = period.months();
            let label = if months == 1 {
                "1 Month".to_string()
            } else {
                format!("{} Months", months)
            };
            TimelineOption { value: months, label }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn review(id: &str, rating: u8, content: &str, created_at: DateTime<Utc>) -> ReviewRecord {
        ReviewRecord {
            id: id.to_string(),
            content: content.to_string(),
            rating,
            created_at,
            store_name: "Downtown Branch".to_string(),
        }
    }

    fn period(months: u8) -> TimelinePeriod {
        TimelinePeriod::new(months).unwrap()
    }

    #[test]
    fn positive_only_five_star_review_is_fully_positive() {
        let score = analyze_review_sentiment(&review("1", 5, "Excellent! Amazing, friendly staff.", at(2024, 6, 1)));

        assert_eq!(score.overall, 1.0);
        assert_eq!(score.positive, 100);
        assert_eq!(score.negative, 0);
        assert_eq!(score.neutral, 0);
    }

    #[test]
    fn no_lexicon_words_is_neutral_but_keeps_rating_sentiment() {
        let score = analyze_review_sentiment(&review("1", 1, "The bagel arrived.", at(2024, 6, 1)));

        assert_eq!(score.positive, 0);
        assert_eq!(score.negative, 0);
        assert_eq!(score.neutral, 100);
        assert!((score.overall - -0.7).abs() < 1e-9);
    }

    #[test]
    fn mixed_words_round_each_share_independently() {
        let score = analyze_review_sentiment(&review("1", 3, "good bad okay", at(2024, 6, 1)));

        assert_eq!(score.positive, 33);
        assert_eq!(score.negative, 33);
        assert_eq!(score.neutral, 33);
        assert_eq!(score.overall, 0.0);
    }

    #[test]
    fn negative_words_pull_overall_down() {
        let score = analyze_review_sentiment(&review("1", 3, "rude and slow service", at(2024, 6, 1)));

        assert!((score.overall - -0.3).abs() < 1e-9);
        assert_eq!(score.negative, 100);
    }

    #[test]
    fn empty_batch_is_stable_with_no_months() {
        for months in 1..=6 {
            let trends = analyze_sentiment_trends_at(&[], period(months), at(2024, 6, 15));

            assert!(trends.monthly_data.is_empty());
            assert_eq!(trends.overall_trend, SentimentTrend::Stable);
            assert!(trends.key_insights.is_empty());
            assert!(trends.recommendations.is_empty());
            assert_eq!(trends.selected_period.months(), months);
        }
    }

    #[test]
    fn window_boundary_is_inclusive_at_exactly_period_months() {
        let now = at(2024, 6, 15);
        let reviews = vec![
            review("edge", 5, "great", at(2024, 3, 15)),
            review("outside", 1, "awful", at(2024, 2, 15)),
        ];

        let trends = analyze_sentiment_trends_at(&reviews, period(3), now);

        assert_eq!(trends.monthly_data.len(), 1);
        assert_eq!(trends.monthly_data[0].month, "Mar 2024");
        assert_eq!(trends.monthly_data[0].total_reviews, 1);
    }

    #[test]
    fn month_end_window_spills_into_following_month() {
        let now = at(2024, 5, 31);
        let reviews = vec![review("leap", 5, "great", at(2024, 3, 1))];

        let trends = analyze_sentiment_trends_at(&reviews, period(3), now);
        assert!(trends.monthly_data.is_empty());

        let reviews = vec![review("spill", 5, "great", at(2024, 3, 2))];
        let trends = analyze_sentiment_trends_at(&reviews, period(3), now);
        assert_eq!(trends.monthly_data.len(), 1);
    }

    #[test]
    fn window_start_rolls_back_across_year() {
        let start = period_start(at(2024, 2, 10), period(4));

        assert_eq!(start, at(2023, 10, 10));
    }

    #[test]
    fn months_are_chronological_across_year_rollover() {
        let now = at(2024, 2, 20);
        let reviews = vec![
            review("1", 4, "good", at(2024, 2, 3)),
            review("2", 4, "good", at(2023, 12, 5)),
            review("3", 4, "good", at(2024, 1, 9)),
            review("4", 4, "good", at(2023, 12, 28)),
        ];

        let trends = analyze_sentiment_trends_at(&reviews, period(3), now);
        let months: Vec<&str> = trends.monthly_data.iter().map(|m| m.month.as_str()).collect();

        assert_eq!(months, vec!["Dec 2023", "Jan 2024", "Feb 2024"]);
        assert_eq!(trends.monthly_data[0].total_reviews, 2);
    }

    #[test]
    fn opposite_reviews_in_one_month_average_out() {
        let now = at(2024, 6, 20);
        let reviews = vec![
            review("1", 5, "excellent amazing", at(2024, 6, 2)),
            review("2", 1, "terrible awful", at(2024, 6, 3)),
        ];

        let trends = analyze_sentiment_trends_at(&reviews, period(1), now);
        let june = &trends.monthly_data[0];

        assert_eq!(june.total_reviews, 2);
        assert_eq!(june.average_rating, 3.0);
        assert_eq!(june.positive, 50);
        assert_eq!(june.negative, 50);
        assert_eq!(june.neutral, 0);
        assert_eq!(trends.key_insights[0], "Analyzing sentiment for the last 1 month");
        assert_eq!(
            trends.recommendations[0],
            "Monitor daily sentiment changes for immediate response opportunities"
        );
    }

    #[test]
    fn average_rating_rounds_to_one_decimal() {
        let now = at(2024, 6, 20);
        let reviews = vec![
            review("1", 5, "", at(2024, 6, 1)),
            review("2", 4, "", at(2024, 6, 2)),
            review("3", 4, "", at(2024, 6, 3)),
        ];

        let trends = analyze_sentiment_trends_at(&reviews, period(1), now);

        assert_eq!(trends.monthly_data[0].average_rating, 4.3);
        assert_eq!(trends.monthly_data[0].neutral, 100);
    }

    #[test]
    fn rising_positivity_is_improving() {
        let now = at(2024, 6, 20);
        let reviews = vec![
            review("1", 1, "terrible", at(2024, 3, 5)),
            review("2", 2, "bad", at(2024, 4, 5)),
            review("3", 5, "great", at(2024, 5, 5)),
            review("4", 5, "excellent", at(2024, 6, 5)),
        ];

        let trends = analyze_sentiment_trends_at(&reviews, period(4), now);

        assert_eq!(trends.overall_trend, SentimentTrend::Improving);
        assert_eq!(
            trends.key_insights,
            vec![
                "Analyzing sentiment trends over the last 4 months",
                "Best sentiment month: May 2024 (100% positive)",
                "Challenging month: Mar 2024 (100% negative)",
                "Recent improvement in sentiment trends",
            ]
        );
        assert_eq!(
            trends.recommendations,
            vec![
                "Implement long-term strategies for sustained sentiment improvement",
                "Maintain current positive practices and customer service standards",
                "Encourage more customer reviews to get better sentiment insights",
                "Respond to all reviews within 24 hours to show customer care",
                "Use negative feedback to identify and fix operational issues",
            ]
        );
    }

    #[test]
    fn falling_positivity_is_declining_and_truncated_to_five() {
        let now = at(2024, 6, 20);
        let reviews = vec![
            review("1", 5, "great", at(2024, 5, 5)),
            review("2", 1, "awful", at(2024, 6, 5)),
        ];

        let trends = analyze_sentiment_trends_at(&reviews, period(2), now);

        assert_eq!(trends.overall_trend, SentimentTrend::Declining);
        assert!(trends
            .key_insights
            .contains(&"Recent decline in sentiment - immediate attention needed".to_string()));
        assert_eq!(
            trends.recommendations,
            vec![
                "Focus on short-term sentiment improvements and quick wins",
                "Address negative feedback immediately to prevent sentiment decline",
                "Implement strategies to boost positive customer experiences",
                "Review recent changes that may have impacted customer satisfaction",
                "Increase proactive customer outreach and feedback collection",
            ]
        );
    }

    #[test]
    fn single_month_is_stable() {
        let now = at(2024, 6, 20);
        let reviews = vec![review("1", 5, "great", at(2024, 6, 5))];

        let trends = analyze_sentiment_trends_at(&reviews, period(6), now);

        assert_eq!(trends.overall_trend, SentimentTrend::Stable);
        assert!(trends
            .key_insights
            .contains(&"Strong positive sentiment maintained (100% average)".to_string()));
    }

    #[test]
    fn timeline_options_cover_one_to_six_months() {
        let options = timeline_options();

        assert_eq!(options.len(), 6);
        assert_eq!(options[0], TimelineOption { value: 1, label: "1 Month".into() });
        assert_eq!(options[5], TimelineOption { value: 6, label: "6 Months".into() });
    }

    #[test]
    fn chart_points_mirror_monthly_data() {
        let now = at(2024, 6, 20);
        let reviews = vec![review("1", 4, "clean and okay", at(2024, 6, 5))];

        let trends = analyze_sentiment_trends_at(&reviews, period(1), now);
        let chart = chart_data(&trends.monthly_data);

        assert_eq!(chart.len(), 1);
        assert_eq!(chart[0].total, 1);
        assert_eq!(chart[0].positive, 50);
        assert_eq!(chart[0].neutral, 50);
        assert_eq!(chart[0].average_rating, 4.0);
    }

    #[test]
    fn period_outside_range_is_rejected() {
        assert!(TimelinePeriod::new(0).is_err());
        assert!(TimelinePeriod::new(7).is_err());
        assert_eq!(TimelinePeriod::default().months(), 6);
    }
}
