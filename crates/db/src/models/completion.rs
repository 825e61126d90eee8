//! Completed exercise logs joined to their route and member.
//!
//! A completion is read-only here: rows are fetched per request as snapshots
//! and handed to the ranking layer, which never writes them back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Route columns carried on a completion. Ids are opaque strings so rows
/// from the local store and the hosted backend share one shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct RouteRef {
    pub id: String,
    pub wall_type: String,
    pub grade_value: Option<String>,
    pub grade_detail: Option<String>,
    pub name: String,
    pub hold_count: i64,
}

/// Member columns carried on a completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct MemberRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CompletionRecord {
    pub id: String,
    pub logged_at: NaiveDate,
    pub route: Option<RouteRef>,
    pub member: Option<MemberRef>,
}

impl CompletionRecord {
    /// Route and both grade halves, when the record can be ranked at all.
    pub fn graded_route(&self) -> Option<(&RouteRef, &str, &str)> {
        let route = self.route.as_ref()?;
        let value = route.grade_value.as_deref()?;
        let detail = route.grade_detail.as_deref()?;
        Some((route, value, detail))
    }

    pub fn is_eligible(&self) -> bool {
        self.graded_route().is_some()
    }

    /// Completed logs with `start <= logged_at <= end`, oldest insert first.
    pub async fn find_completed_between(
        pool: &SqlitePool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CompletionJoinRow>(
            r#"SELECT
                el.id              AS id,
                el.logged_at       AS logged_at,
                r.id               AS route_id,
                r.wall_type        AS route_wall_type,
                r.grade_value      AS route_grade_value,
                r.grade_detail     AS route_grade_detail,
                r.name             AS route_name,
                r.hold_count       AS route_hold_count,
                p.id               AS profile_id,
                p.name             AS profile_name
            FROM exercise_logs el
            LEFT JOIN routes r   ON r.id = el.route_id
            LEFT JOIN profiles p ON p.id = el.profile_id
            WHERE el.is_completed = 1
              AND el.logged_at >= $1
              AND el.logged_at <= $2
            ORDER BY el.rowid ASC"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(CompletionRecord::from).collect())
    }
}

/// Flat LEFT JOIN row; every joined column is nullable.
#[derive(Debug, FromRow)]
struct CompletionJoinRow {
    id: Uuid,
    logged_at: NaiveDate,
    route_id: Option<Uuid>,
    route_wall_type: Option<String>,
    route_grade_value: Option<String>,
    route_grade_detail: Option<String>,
    route_name: Option<String>,
    route_hold_count: Option<i64>,
    profile_id: Option<Uuid>,
    profile_name: Option<String>,
}

impl From<CompletionJoinRow> for CompletionRecord {
    fn from(row: CompletionJoinRow) -> Self {
        let route = row.route_id.map(|id| RouteRef {
            id: id.to_string(),
            wall_type: row.route_wall_type.unwrap_or_default(),
            grade_value: row.route_grade_value,
            grade_detail: row.route_grade_detail,
            name: row.route_name.unwrap_or_default(),
            hold_count: row.route_hold_count.unwrap_or_default(),
        });
        let member = row.profile_id.map(|id| MemberRef {
            id: id.to_string(),
            name: row.profile_name.unwrap_or_default(),
        });
        CompletionRecord {
            id: row.id.to_string(),
            logged_at: row.logged_at,
            route,
            member,
        }
    }
}

/// A to-one embed that the hosted backend may return either as an object or
/// as a list, depending on how it infers the relationship cardinality.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Related<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Related<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Related::One(value) => Some(value),
            Related::Many(values) => values.into_iter().next(),
        }
    }
}

/// Route embed as the hosted backend sends it. Every column is optional and
/// loosely typed; only a missing grade keeps the completion off a leaderboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRouteRef {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub wall_type: Option<Value>,
    #[serde(default)]
    pub grade_value: Option<Value>,
    #[serde(default)]
    pub grade_detail: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub hold_count: Option<Value>,
}

impl From<RawRouteRef> for RouteRef {
    fn from(raw: RawRouteRef) -> Self {
        RouteRef {
            id: opaque_text(raw.id).unwrap_or_default(),
            wall_type: opaque_text(raw.wall_type).unwrap_or_default(),
            grade_value: opaque_text(raw.grade_value),
            grade_detail: opaque_text(raw.grade_detail),
            name: opaque_text(raw.name).unwrap_or_default(),
            hold_count: raw
                .hold_count
                .and_then(|v| v.as_i64().or_else(|| v.as_str()?.parse().ok()))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMemberRef {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
}

impl From<RawMemberRef> for MemberRef {
    fn from(raw: RawMemberRef) -> Self {
        MemberRef {
            id: opaque_text(raw.id).unwrap_or_default(),
            name: opaque_text(raw.name).unwrap_or_default(),
        }
    }
}

/// Completion row as it arrives from the hosted backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCompletionRow {
    pub id: Value,
    pub logged_at: NaiveDate,
    #[serde(default)]
    pub route: Option<Related<RawRouteRef>>,
    #[serde(default)]
    pub profile: Option<Related<RawMemberRef>>,
}

impl RawCompletionRow {
    /// Decode one element of a response array.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn normalize(self) -> CompletionRecord {
        CompletionRecord {
            id: opaque_text(Some(self.id)).unwrap_or_default(),
            logged_at: self.logged_at,
            route: self.route.and_then(Related::into_option).map(RouteRef::from),
            member: self.profile.and_then(Related::into_option).map(MemberRef::from),
        }
    }
}

/// Strings pass through, numbers and other scalars are rendered, null is absent.
fn opaque_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
