use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::path::Path;

use crate::models::*;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS stores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        brand TEXT NOT NULL DEFAULT '',
        address TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        website TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        store_id INTEGER NOT NULL REFERENCES stores(id),
        content TEXT NOT NULL,
        rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        source TEXT NOT NULL DEFAULT 'manual',
        replied INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_stores_brand ON stores(brand);
    CREATE INDEX IF NOT EXISTS idx_reviews_store ON reviews(store_id, created_at);
    CREATE TABLE IF NOT EXISTS visibility_snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        store_id INTEGER NOT NULL REFERENCES stores(id),
        recorded_at TEXT NOT NULL,
        input_json TEXT NOT NULL
    );
";

/// Open the dashboard database, creating tables on first use
pub fn get_connection(db_path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
}

// =====================
// Stores
// =====================

fn store_from_row(row: &Row<'_>) -> Result<Store> {
    Ok(Store {
        id: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        website: row.get(6)?,
        description: row.get(7)?,
        category: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Get all stores
pub fn get_all_stores(conn: &Connection) -> Result<Vec<Store>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, brand, address, phone, email, website, description, category, created_at
         FROM stores
         ORDER BY name",
    )?;

    let stores = stmt
        .query_map([], store_from_row)?
        .filter_map(|r| r.ok())
        .collect();

    Ok(stores)
}

/// Get every location of a brand
pub fn get_stores_by_brand(conn: &Connection, brand: &str) -> Result<Vec<Store>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, brand, address, phone, email, website, description, category, created_at
         FROM stores
         WHERE brand = ?1
         ORDER BY name",
    )?;

    let stores = stmt
        .query_map([brand], store_from_row)?
        .filter_map(|r| r.ok())
        .collect();

    Ok(stores)
}

pub fn get_store(conn: &Connection, store_id: i64) -> Result<Option<Store>> {
    conn.query_row(
        "SELECT id, name, brand, address, phone, email, website, description, category, created_at
         FROM stores
         WHERE id = ?",
        [store_id],
        store_from_row,
    )
    .optional()
}

pub fn insert_store(conn: &Connection, store: &NewStore) -> Result<Store> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO stores (name, brand, address, phone, email, website, description, category, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            store.name,
            store.brand,
            store.address,
            store.phone,
            store.email,
            store.website,
            store.description,
            store.category,
            created_at,
        ],
    )?;

    Ok(Store {
        id: conn.last_insert_rowid(),
        name: store.name.clone(),
        brand: store.brand.clone(),
        address: store.address.clone(),
        phone: store.phone.clone(),
        email: store.email.clone(),
        website: store.website.clone(),
        description: store.description.clone(),
        category: store.category.clone(),
        created_at,
    })
}

/// Replace a store's details. Returns `None` when the store does not exist.
pub fn update_store(conn: &Connection, store_id: i64, store: &NewStore) -> Result<Option<Store>> {
    let changed = conn.execute(
        "UPDATE stores
         SET name = ?1, brand = ?2, address = ?3, phone = ?4, email = ?5,
             website = ?6, description = ?7, category = ?8
         WHERE id = ?9",
        params![
            store.name,
            store.brand,
            store.address,
            store.phone,
            store.email,
            store.website,
            store.description,
            store.category,
            store_id,
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_store(conn, store_id)
}

/// Delete a store together with its reviews and metric snapshots
pub fn delete_store(conn: &Connection, store_id: i64) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM reviews WHERE store_id = ?", [store_id])?;
    tx.execute("DELETE FROM visibility_snapshots WHERE store_id = ?", [store_id])?;
    let deleted = tx.execute("DELETE FROM stores WHERE id = ?", [store_id])?;
    tx.commit()?;

    Ok(deleted > 0)
}

// =====================
// Reviews
// =====================

fn review_from_row(row: &Row<'_>) -> Result<StoredReview> {
    Ok(StoredReview {
        id: row.get(0)?,
        store_id: row.get(1)?,
        store_name: row.get(2)?,
        content: row.get(3)?,
        rating: row.get(4)?,
        source: row.get(5)?,
        replied: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Get reviews, newest first, optionally for a single store
pub fn get_reviews(conn: &Connection, store_id: Option<i64>) -> Result<Vec<StoredReview>> {
    let mut stmt = conn.prepare(
        "SELECT
            r.id, r.store_id, s.name, r.content,
            r.rating, r.source, r.replied, r.created_at
         FROM reviews r
         JOIN stores s ON r.store_id = s.id
         WHERE ?1 IS NULL OR r.store_id = ?1
         ORDER BY r.created_at DESC, r.id DESC",
    )?;

    let reviews = stmt
        .query_map([store_id], review_from_row)?
        .filter_map(|r| r.ok())
        .collect();

    Ok(reviews)
}

/// Get reviews across every location of a brand, newest first
pub fn get_reviews_by_brand(conn: &Connection, brand: &str) -> Result<Vec<StoredReview>> {
    let mut stmt = conn.prepare(
        "SELECT
            r.id, r.store_id, s.name, r.content,
            r.rating, r.source, r.replied, r.created_at
         FROM reviews r
         JOIN stores s ON r.store_id = s.id
         WHERE s.brand = ?1
         ORDER BY r.created_at DESC, r.id DESC",
    )?;

    let reviews = stmt
        .query_map([brand], review_from_row)?
        .filter_map(|r| r.ok())
        .collect();

    Ok(reviews)
}

/// Insert a review. The rating must already be checked by the caller.
pub fn insert_review(conn: &Connection, review: &NewReview) -> Result<StoredReview> {
    let created_at = review.created_at.unwrap_or_else(Utc::now);
    conn.execute(
        "INSERT INTO reviews (store_id, content, rating, source, replied, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            review.store_id,
            review.content,
            review.rating,
            review.source,
            review.replied,
            created_at,
        ],
    )?;
    let id = conn.last_insert_rowid();

    let store_name: String = conn.query_row(
        "SELECT name FROM stores WHERE id = ?",
        [review.store_id],
        |row| row.get(0),
    )?;

    Ok(StoredReview {
        id,
        store_id: review.store_id,
        store_name,
        content: review.content.clone(),
        rating: review.rating,
        source: review.source.clone(),
        replied: review.replied,
        created_at,
    })
}

/// Get review summary statistics
pub fn get_review_stats(conn: &Connection, store_id: Option<i64>) -> Result<ReviewStats> {
    let (total_reviews, average_rating, replied_count): (i64, f64, i64) = conn.query_row(
        "SELECT
            COUNT(*),
            COALESCE(AVG(rating), 0.0),
            COALESCE(SUM(CASE WHEN replied THEN 1 ELSE 0 END), 0)
         FROM reviews
         WHERE ?1 IS NULL OR store_id = ?1",
        [store_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let mut stats = ReviewStats::default();

    let mut stmt = conn.prepare(
        "SELECT rating, COUNT(*)
         FROM reviews
         WHERE ?1 IS NULL OR store_id = ?1
         GROUP BY rating",
    )?;
    let counts = stmt.query_map([store_id], |row| {
        Ok((row.get::<_, u8>(0)?, row.get::<_, i64>(1)?))
    })?;
    for (rating, count) in counts.filter_map(|r| r.ok()) {
        if let Some(bucket) = stats.rating_distribution.iter_mut().find(|b| b.rating == rating) {
            bucket.count = count;
        }
    }

    stats.total_reviews = total_reviews;
    stats.average_rating = (average_rating * 10.0).round() / 10.0;
    stats.replied_count = replied_count;
    stats.response_rate = if total_reviews > 0 {
        (replied_count as f64 / total_reviews as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    Ok(stats)
}

// =====================
// Visibility snapshots
// =====================

/// Record the metrics a store's visibility score is computed from
pub fn save_visibility_snapshot(
    conn: &Connection,
    store_id: i64,
    input: &VisibilityScoreInput,
) -> Result<VisibilitySnapshot> {
    let recorded_at = Utc::now();
    let input_json =
        serde_json::to_string(input).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO visibility_snapshots (store_id, recorded_at, input_json) VALUES (?1, ?2, ?3)",
        params![store_id, recorded_at, input_json],
    )?;

    Ok(VisibilitySnapshot {
        store_id,
        recorded_at,
        input: input.clone(),
    })
}

/// Latest metric snapshot for a store, if any
pub fn get_latest_visibility_snapshot(
    conn: &Connection,
    store_id: i64,
) -> Result<Option<VisibilitySnapshot>> {
    conn.query_row(
        "SELECT recorded_at, input_json
         FROM visibility_snapshots
         WHERE store_id = ?
         ORDER BY recorded_at DESC, id DESC
         LIMIT 1",
        [store_id],
        |row| {
            let json: String = row.get(1)?;
            let input = serde_json::from_str(&json)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
            Ok(VisibilitySnapshot {
                store_id,
                recorded_at: row.get(0)?,
                input,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::sample_visibility_input;
    use chrono::{TimeZone, Utc};

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn store(conn: &Connection, name: &str) -> Store {
        branded_store(conn, name, "")
    }

    fn branded_store(conn: &Connection, name: &str, brand: &str) -> Store {
        insert_store(
            conn,
            &NewStore {
                name: name.to_string(),
                brand: brand.to_string(),
                category: "Coffee".to_string(),
                ..NewStore::default()
            },
        )
        .unwrap()
    }

    fn review(store_id: i64, rating: u8, day: u32, replied: bool) -> NewReview {
        NewReview {
            store_id,
            content: "Good coffee".to_string(),
            rating,
            created_at: Some(Utc.with_ymd_and_hms(2024, 7, day, 9, 0, 0).unwrap()),
            source: "GMB".to_string(),
            replied,
        }
    }

    #[test]
    fn stores_round_trip_through_lookup() {
        let conn = memory_db();
        let created = store(&conn, "Downtown Branch");

        let fetched = get_store(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Downtown Branch");
        assert_eq!(fetched.category, "Coffee");
        assert!(get_store(&conn, created.id + 100).unwrap().is_none());
        assert_eq!(get_all_stores(&conn).unwrap().len(), 1);
    }

    #[test]
    fn reviews_are_newest_first_and_filterable_by_store() {
        let conn = memory_db();
        let downtown = store(&conn, "Downtown Branch");
        let westwood = store(&conn, "Westwood Store");

        insert_review(&conn, &review(downtown.id, 5, 1, true)).unwrap();
        insert_review(&conn, &review(downtown.id, 2, 20, false)).unwrap();
        insert_review(&conn, &review(westwood.id, 4, 10, true)).unwrap();

        let all = get_reviews(&conn, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].rating, 2);
        assert_eq!(all[0].store_name, "Downtown Branch");

        let westwood_reviews = get_reviews(&conn, Some(westwood.id)).unwrap();
        assert_eq!(westwood_reviews.len(), 1);
        assert_eq!(westwood_reviews[0].store_name, "Westwood Store");
    }

    #[test]
    fn out_of_range_rating_is_rejected_by_schema() {
        let conn = memory_db();
        let downtown = store(&conn, "Downtown Branch");

        assert!(insert_review(&conn, &review(downtown.id, 6, 1, false)).is_err());
    }

    #[test]
    fn review_stats_summarise_ratings_and_replies() {
        let conn = memory_db();
        let downtown = store(&conn, "Downtown Branch");
        insert_review(&conn, &review(downtown.id, 5, 1, true)).unwrap();
        insert_review(&conn, &review(downtown.id, 4, 2, true)).unwrap();
        insert_review(&conn, &review(downtown.id, 4, 3, false)).unwrap();

        let stats = get_review_stats(&conn, Some(downtown.id)).unwrap();

        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_rating, 4.3);
        assert_eq!(stats.replied_count, 2);
        assert_eq!(stats.response_rate, 66.7);
        assert_eq!(stats.rating_distribution[3], RatingCount { rating: 4, count: 2 });
        assert_eq!(stats.rating_distribution[4], RatingCount { rating: 5, count: 1 });
        assert_eq!(stats.rating_distribution[0].count, 0);
    }

    #[test]
    fn empty_store_has_zeroed_stats() {
        let conn = memory_db();

        assert_eq!(get_review_stats(&conn, None).unwrap(), ReviewStats::default());
    }

    #[test]
    fn latest_visibility_snapshot_wins() {
        let conn = memory_db();
        let downtown = store(&conn, "Downtown Branch");
        assert!(get_latest_visibility_snapshot(&conn, downtown.id).unwrap().is_none());

        let mut input = sample_visibility_input();
        save_visibility_snapshot(&conn, downtown.id, &input).unwrap();
        input.gmb.photos_count = 42;
        save_visibility_snapshot(&conn, downtown.id, &input).unwrap();

        let latest = get_latest_visibility_snapshot(&conn, downtown.id).unwrap().unwrap();
        assert_eq!(latest.input.gmb.photos_count, 42);
        assert_eq!(latest.input.local_seo.local_keyword_rankings.len(), 3);
    }

    #[test]
    fn stores_are_grouped_by_brand() {
        let conn = memory_db();
        branded_store(&conn, "Westwood Store", "Bean Co");
        branded_store(&conn, "Downtown Branch", "Bean Co");
        branded_store(&conn, "Corner Cafe", "");

        let bean_co = get_stores_by_brand(&conn, "Bean Co").unwrap();
        assert_eq!(bean_co.len(), 2);
        assert_eq!(bean_co[0].name, "Downtown Branch");
        assert_eq!(bean_co[0].brand, "Bean Co");
        assert!(get_stores_by_brand(&conn, "Other").unwrap().is_empty());
    }

    #[test]
    fn brand_reviews_span_its_locations() {
        let conn = memory_db();
        let downtown = branded_store(&conn, "Downtown Branch", "Bean Co");
        let westwood = branded_store(&conn, "Westwood Store", "Bean Co");
        let corner = store(&conn, "Corner Cafe");
        insert_review(&conn, &review(downtown.id, 5, 1, true)).unwrap();
        insert_review(&conn, &review(westwood.id, 3, 2, false)).unwrap();
        insert_review(&conn, &review(corner.id, 1, 3, false)).unwrap();

        let reviews = get_reviews_by_brand(&conn, "Bean Co").unwrap();

        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].store_name, "Westwood Store");
        assert!(reviews.iter().all(|r| r.store_id != corner.id));
    }

    #[test]
    fn update_store_replaces_details() {
        let conn = memory_db();
        let created = store(&conn, "Downtown Branch");

        let changes = NewStore {
            name: "Downtown Flagship".to_string(),
            brand: "Bean Co".to_string(),
            phone: "555-0100".to_string(),
            ..NewStore::default()
        };
        let updated = update_store(&conn, created.id, &changes).unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Downtown Flagship");
        assert_eq!(updated.brand, "Bean Co");
        assert_eq!(updated.category, "");
        assert_eq!(updated.created_at, created.created_at);
        assert!(update_store(&conn, created.id + 100, &changes).unwrap().is_none());
    }

    #[test]
    fn delete_store_removes_reviews_and_snapshots() {
        let conn = memory_db();
        let downtown = store(&conn, "Downtown Branch");
        let westwood = store(&conn, "Westwood Store");
        insert_review(&conn, &review(downtown.id, 5, 1, true)).unwrap();
        insert_review(&conn, &review(westwood.id, 4, 2, true)).unwrap();
        save_visibility_snapshot(&conn, downtown.id, &sample_visibility_input()).unwrap();

        assert!(delete_store(&conn, downtown.id).unwrap());

        assert!(get_store(&conn, downtown.id).unwrap().is_none());
        assert!(get_reviews(&conn, Some(downtown.id)).unwrap().is_empty());
        assert!(get_latest_visibility_snapshot(&conn, downtown.id).unwrap().is_none());
        assert_eq!(get_reviews(&conn, None).unwrap().len(), 1);
        assert!(!delete_store(&conn, downtown.id).unwrap());
    }
}
