//! SQL statement catalog.
//!
//! Fixed statements are plain constants with `$n` placeholders. Aggregates
//! differ only by table, owner column and metric column, so they are built
//! from [`Scope`] and [`Metric`], whose identifiers come from a closed set;
//! ids are always bound, never spliced.
//!
//! Timestamps are stored as Eastern wall-clock time without a zone. Every
//! "now" on the query side is therefore the database clock shifted by the
//! same fixed offset, see [`LOCAL_NOW`].

use super::models::{Metric, Scope};

/// Current Eastern wall-clock time (UTC-4, no DST), as `timestamp`.
pub const LOCAL_NOW: &str = "((NOW() AT TIME ZONE 'UTC') - INTERVAL '4 hours')";

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

pub const CREATE_SENSORS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS sensors (
        id        UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name      TEXT NOT NULL,
        latitude  DOUBLE PRECISION DEFAULT NULL,
        longitude DOUBLE PRECISION DEFAULT NULL
    )
"#;

/// No foreign key on `sensor_id`: readings for unregistered sensors are
/// accepted. [`DELETE_SENSOR_READINGS`] removes a sensor's rows on delete.
pub const CREATE_DATA_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS data (
        sensor_id   UUID,
        temperature DOUBLE PRECISION DEFAULT NULL,
        humidity    DOUBLE PRECISION DEFAULT NULL,
        pm25        DOUBLE PRECISION DEFAULT NULL,
        tvoc        DOUBLE PRECISION DEFAULT NULL,
        co2         DOUBLE PRECISION DEFAULT NULL,
        date        TIMESTAMP NOT NULL
    )
"#;

pub const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id       UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
"#;

pub const CREATE_USER_DATA_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS user_data (
        user_id     UUID,
        temperature DOUBLE PRECISION DEFAULT NULL,
        humidity    DOUBLE PRECISION DEFAULT NULL,
        pm25        DOUBLE PRECISION DEFAULT NULL,
        tvoc        DOUBLE PRECISION DEFAULT NULL,
        co2         DOUBLE PRECISION DEFAULT NULL,
        date        TIMESTAMP NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
    )
"#;

pub const CREATE_DATA_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS data_sensor_id_date_idx ON data (sensor_id, date)";

pub const CREATE_USER_DATA_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS user_data_user_id_date_idx ON user_data (user_id, date)";

/// Dependency order: each table only references tables created before it.
pub const SCHEMA: [&str; 6] = [
    CREATE_SENSORS_TABLE,
    CREATE_DATA_TABLE,
    CREATE_USERS_TABLE,
    CREATE_USER_DATA_TABLE,
    CREATE_DATA_INDEX,
    CREATE_USER_DATA_INDEX,
];

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

pub const INSERT_SENSOR: &str = r#"
    INSERT INTO sensors (name, latitude, longitude)
    VALUES ($1, $2, $3)
    RETURNING id
"#;

pub const SELECT_SENSOR: &str = "SELECT id, name, latitude, longitude FROM sensors WHERE id = $1";

pub const SELECT_SENSORS: &str = "SELECT id, name, latitude, longitude FROM sensors";

/// NULL parameters leave the column untouched.
pub const UPDATE_SENSOR: &str = r#"
    UPDATE sensors
    SET name      = COALESCE($1, name),
        latitude  = COALESCE($2, latitude),
        longitude = COALESCE($3, longitude)
    WHERE id = $4
    RETURNING id
"#;

pub const DELETE_SENSOR: &str = "DELETE FROM sensors WHERE id = $1 RETURNING id";

/// Run in the same transaction as [`DELETE_SENSOR`].
pub const DELETE_SENSOR_READINGS: &str = "DELETE FROM data WHERE sensor_id = $1";

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub const INSERT_USER: &str = r#"
    INSERT INTO users (username, password)
    VALUES ($1, $2)
    RETURNING id
"#;

pub const SELECT_USER_CREDENTIALS: &str = "SELECT id, password FROM users WHERE username = $1";

/// NULL parameters leave the column untouched.
pub const UPDATE_USER: &str = r#"
    UPDATE users
    SET username = COALESCE($1, username),
        password = COALESCE($2, password)
    WHERE id = $3
    RETURNING id
"#;

pub const DELETE_USER: &str = "DELETE FROM users WHERE id = $1 RETURNING id";

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

pub const INSERT_READING: &str = r#"
    INSERT INTO data (sensor_id, temperature, humidity, pm25, tvoc, co2, date)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

pub const SELECT_LATEST_READING: &str = r#"
    SELECT temperature, humidity, pm25, tvoc, co2, date
    FROM data
    WHERE sensor_id = $1
    ORDER BY date DESC
    LIMIT 1
"#;

pub const INSERT_USER_READING: &str = r#"
    INSERT INTO user_data (user_id, temperature, humidity, pm25, tvoc, co2, date)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// `AVG(metric)` over the owner's rows from the last ten minutes.
/// Yields a single row whose `average` is NULL when nothing matched.
pub fn rolling_average(scope: Scope, metric: Metric) -> String {
    let (table, owner, column) = (scope.table(), scope.owner_column(), metric.column());
    format!(
        r#"
        SELECT AVG({column}) AS average
        FROM {table}
        WHERE {owner} = $1
          AND date >= {LOCAL_NOW} - INTERVAL '10 minutes'
        "#
    )
}

/// One row per calendar day for the seven days ending today, newest first.
/// Days without rows report 0.
pub fn daily_average(scope: Scope, metric: Metric) -> String {
    let (table, owner, column) = (scope.table(), scope.owner_column(), metric.column());
    format!(
        r#"
        WITH days AS (
            SELECT generate_series(
                {LOCAL_NOW}::date::timestamp - INTERVAL '6 days',
                {LOCAL_NOW}::date::timestamp,
                INTERVAL '1 day'
            )::date AS day
        )
        SELECT d.day,
               COALESCE(AVG(r.{column}), 0)::DOUBLE PRECISION AS average
        FROM days d
        LEFT JOIN {table} r
               ON r.{owner} = $1
              AND r.date >= d.day
              AND r.date <  d.day + 1
        GROUP BY d.day
        ORDER BY d.day DESC
        "#
    )
}

/// One row per hour from local midnight through the current hour, oldest
/// first. Hours without rows report 0.
pub fn hourly_average(scope: Scope, metric: Metric) -> String {
    let (table, owner, column) = (scope.table(), scope.owner_column(), metric.column());
    format!(
        r#"
        WITH hours AS (
            SELECT generate_series(
                date_trunc('day',  {LOCAL_NOW}),
                date_trunc('hour', {LOCAL_NOW}),
                INTERVAL '1 hour'
            ) AS hour
        )
        SELECT h.hour,
               COALESCE(AVG(r.{column}), 0)::DOUBLE PRECISION AS average
        FROM hours h
        LEFT JOIN {table} r
               ON r.{owner} = $1
              AND r.date >= h.hour
              AND r.date <  h.hour + INTERVAL '1 hour'
        GROUP BY h.hour
        ORDER BY h.hour ASC
        "#
    )
}
