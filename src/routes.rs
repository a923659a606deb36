use chrono::Utc;
use rocket::serde::json::{json, Json, Value};
use rocket::{delete, get, post, put, routes, Route, State};
use rocket_dyn_templates::{context, Template};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db;
use crate::error::ApiError;
use crate::models::*;
use crate::samples::{sample_reviews, sample_visibility_input};
use crate::sentiment::{analyze_sentiment_trends, chart_data, timeline_options};
use crate::visibility::calculate_score;

/// Run a blocking SQLite call off the async workers
async fn with_db<T, F>(config: &AppConfig, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let path = config.database_path.clone();
    let result = tokio::task::spawn_blocking(move || {
        let conn = db::get_connection(&path)?;
        f(&conn)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(result?)
}

async fn require_store(config: &AppConfig, store_id: i64) -> Result<Store, ApiError> {
    with_db(config, move |conn| db::get_store(conn, store_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("store {} not found", store_id)))
}

fn review_records(reviews: &[StoredReview]) -> Vec<ReviewRecord> {
    reviews.iter().map(ReviewRecord::from).collect()
}

// =====================
// HTML Page Routes
// =====================

#[derive(Default)]
struct DashboardData {
    stores: Vec<Store>,
    selected: Option<Store>,
    snapshot: Option<VisibilitySnapshot>,
    reviews: Vec<StoredReview>,
}

/// Load the requested store, or the first one when it is missing or unknown
fn load_dashboard(conn: &Connection, store: Option<i64>) -> rusqlite::Result<DashboardData> {
    let stores = db::get_all_stores(conn)?;
    let selected = store
        .and_then(|id| stores.iter().find(|s| s.id == id))
        .or_else(|| stores.first())
        .cloned();

    let (snapshot, reviews) = match &selected {
        Some(s) => (
            db::get_latest_visibility_snapshot(conn, s.id)?,
            db::get_reviews(conn, Some(s.id))?,
        ),
        None => (None, Vec::new()),
    };

    Ok(DashboardData { stores, selected, snapshot, reviews })
}

#[get("/?<store>&<period>")]
pub async fn index(config: &State<AppConfig>, store: Option<i64>, period: Option<u8>) -> Template {
    let period = config.resolve_period(period).unwrap_or_else(|err| {
        log::warn!("dashboard: {}, using default period", err);
        config.default_period()
    });

    let data = with_db(config, move |conn| load_dashboard(conn, store))
        .await
        .unwrap_or_else(|err| {
            log::warn!("dashboard: {}, showing empty data", err);
            DashboardData::default()
        });

    let mut using_sample = false;
    let visibility_input = match data.snapshot {
        Some(snapshot) => snapshot.input,
        None if config.use_sample_data => {
            using_sample = true;
            sample_visibility_input()
        }
        None => VisibilityScoreInput::default(),
    };
    let reviews = if data.reviews.is_empty() && config.use_sample_data {
        using_sample = true;
        sample_reviews(Utc::now())
    } else {
        review_records(&data.reviews)
    };

    let visibility = calculate_score(&visibility_input);
    let trends = analyze_sentiment_trends(&reviews, period);
    let chart = chart_data(&trends.monthly_data);

    Template::render("dashboard", context! {
        title: "Dashboard",
        stores: data.stores,
        selected_store: data.selected,
        using_sample: using_sample,
        visibility: visibility,
        trends: trends,
        chart: chart,
        timeline_options: timeline_options(),
        period: period.months(),
    })
}

// =====================
// JSON API Routes
// =====================

#[get("/stores?<brand>")]
pub async fn api_stores(config: &State<AppConfig>, brand: Option<String>) -> Result<Json<Vec<Store>>, ApiError> {
    let stores = with_db(config, move |conn| match brand {
        Some(brand) => db::get_stores_by_brand(conn, &brand),
        None => db::get_all_stores(conn),
    })
    .await?;
    Ok(Json(stores))
}

#[get("/stores/<store_id>")]
pub async fn api_store(config: &State<AppConfig>, store_id: i64) -> Result<Json<Store>, ApiError> {
    Ok(Json(require_store(config, store_id).await?))
}

#[post("/stores", data = "<store>")]
pub async fn api_create_store(config: &State<AppConfig>, store: Json<NewStore>) -> Result<Json<Store>, ApiError> {
    let store = store.into_inner();
    if store.name.trim().is_empty() {
        return Err(ApiError::BadRequest("store name is required".to_string()));
    }

    let created = with_db(config, move |conn| db::insert_store(conn, &store)).await?;
    log::info!("created store {} ({})", created.id, created.name);
    Ok(Json(created))
}

#[put("/stores/<store_id>", data = "<store>")]
pub async fn api_update_store(
    config: &State<AppConfig>,
    store_id: i64,
    store: Json<NewStore>,
) -> Result<Json<Store>, ApiError> {
    let store = store.into_inner();
    if store.name.trim().is_empty() {
        return Err(ApiError::BadRequest("store name is required".to_string()));
    }

    let updated = with_db(config, move |conn| db::update_store(conn, store_id, &store))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("store {} not found", store_id)))?;
    log::info!("updated store {} ({})", updated.id, updated.name);
    Ok(Json(updated))
}

#[delete("/stores/<store_id>")]
pub async fn api_delete_store(config: &State<AppConfig>, store_id: i64) -> Result<Json<Value>, ApiError> {
    if !with_db(config, move |conn| db::delete_store(conn, store_id)).await? {
        return Err(ApiError::NotFound(format!("store {} not found", store_id)));
    }

    log::info!("deleted store {}", store_id);
    Ok(Json(json!({ "success": true })))
}

#[get("/reviews?<store>")]
pub async fn api_reviews(config: &State<AppConfig>, store: Option<i64>) -> Result<Json<Vec<StoredReview>>, ApiError> {
    let reviews = with_db(config, move |conn| db::get_reviews(conn, store)).await?;
    Ok(Json(reviews))
}

#[post("/reviews", data = "<review>")]
pub async fn api_create_review(
    config: &State<AppConfig>,
    review: Json<NewReview>,
) -> Result<Json<StoredReview>, ApiError> {
    let review = review.into_inner();
    if !(1..=5).contains(&review.rating) {
        return Err(crate::error::AnalyticsError::InvalidRating(review.rating).into());
    }
    require_store(config, review.store_id).await?;

    let created = with_db(config, move |conn| db::insert_review(conn, &review)).await?;
    Ok(Json(created))
}

#[get("/reviews/stats?<store>")]
pub async fn api_review_stats(config: &State<AppConfig>, store: Option<i64>) -> Result<Json<Value>, ApiError> {
    let stats = with_db(config, move |conn| db::get_review_stats(conn, store)).await?;
    Ok(Json(json!({
        "success": true,
        "stats": stats,
    })))
}

#[post("/visibility/score", data = "<input>")]
pub fn api_visibility_score(input: Json<VisibilityScoreInput>) -> Json<VisibilityScoreBreakdown> {
    Json(calculate_score(&input))
}

#[get("/visibility/<store_id>")]
pub async fn api_store_visibility(
    config: &State<AppConfig>,
    store_id: i64,
) -> Result<Json<VisibilityScoreBreakdown>, ApiError> {
    require_store(config, store_id).await?;

    let snapshot = with_db(config, move |conn| db::get_latest_visibility_snapshot(conn, store_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no visibility metrics recorded for store {}", store_id)))?;

    Ok(Json(calculate_score(&snapshot.input)))
}

#[post("/visibility/<store_id>", data = "<input>")]
pub async fn api_record_visibility(
    config: &State<AppConfig>,
    store_id: i64,
    input: Json<VisibilityScoreInput>,
) -> Result<Json<VisibilityScoreBreakdown>, ApiError> {
    require_store(config, store_id).await?;

    let input = input.into_inner();
    let breakdown = calculate_score(&input);
    with_db(config, move |conn| db::save_visibility_snapshot(conn, store_id, &input)).await?;
    log::info!("store {} visibility score {}", store_id, breakdown.total_score);

    Ok(Json(breakdown))
}

#[post("/sentiment/analyze?<period>", data = "<reviews>")]
pub fn api_analyze_sentiment(
    config: &State<AppConfig>,
    period: Option<u8>,
    reviews: Json<Vec<ReviewRecord>>,
) -> Result<Json<SentimentTrends>, ApiError> {
    let period = config.resolve_period(period)?;
    for review in reviews.iter() {
        review.validate()?;
    }

    Ok(Json(analyze_sentiment_trends(&reviews, period)))
}

/// Trends over stored reviews. A store id takes precedence over a brand.
async fn stored_trends(
    config: &AppConfig,
    store: Option<i64>,
    brand: Option<String>,
    period: Option<u8>,
) -> Result<SentimentTrends, ApiError> {
    let period = config.resolve_period(period)?;
    if let Some(id) = store {
        require_store(config, id).await?;
    }

    let reviews = with_db(config, move |conn| match (store, brand) {
        (None, Some(brand)) => db::get_reviews_by_brand(conn, &brand),
        _ => db::get_reviews(conn, store),
    })
    .await?;
    Ok(analyze_sentiment_trends(&review_records(&reviews), period))
}

#[get("/sentiment?<store>&<brand>&<period>")]
pub async fn api_sentiment(
    config: &State<AppConfig>,
    store: Option<i64>,
    brand: Option<String>,
    period: Option<u8>,
) -> Result<Json<SentimentTrends>, ApiError> {
    Ok(Json(stored_trends(config, store, brand, period).await?))
}

#[get("/sentiment/chart?<store>&<brand>&<period>")]
pub async fn api_sentiment_chart(
    config: &State<AppConfig>,
    store: Option<i64>,
    brand: Option<String>,
    period: Option<u8>,
) -> Result<Json<Vec<SentimentChartPoint>>, ApiError> {
    let trends = stored_trends(config, store, brand, period).await?;
    Ok(Json(chart_data(&trends.monthly_data)))
}

#[get("/sentiment/timeline-options")]
pub fn api_timeline_options() -> Json<Vec<TimelineOption>> {
    Json(timeline_options())
}

// =====================
// Route Collections
// =====================

pub fn index_routes() -> Vec<Route> {
    routes![index]
}

pub fn api_routes() -> Vec<Route> {
    routes![
        api_stores,
        api_store,
        api_create_store,
        api_update_store,
        api_delete_store,
        api_reviews,
        api_create_review,
        api_review_stats,
        api_visibility_score,
        api_store_visibility,
        api_record_visibility,
        api_analyze_sentiment,
        api_sentiment,
        api_sentiment_chart,
        api_timeline_options,
    ]
}
