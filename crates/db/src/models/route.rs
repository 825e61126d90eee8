use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Wall profile a route is set on
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "wall_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WallType {
    Vertical,
    SlightOverhang,
    Overhang,
    ExtremeOverhang,
}

impl WallType {
    pub fn label(self) -> &'static str {
        match self {
            WallType::Vertical => "직벽",
            WallType::SlightOverhang => "약오버행",
            WallType::Overhang => "오버행",
            WallType::ExtremeOverhang => "극오버행",
        }
    }
}

/// Coarse grade band. Declaration order is difficulty order.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, TS, EnumString, Display,
)]
pub enum GradeValue {
    #[serde(rename = "5.9")]
    #[sqlx(rename = "5.9")]
    #[strum(serialize = "5.9")]
    FiveNine,
    #[serde(rename = "10")]
    #[sqlx(rename = "10")]
    #[strum(serialize = "10")]
    Ten,
    #[serde(rename = "11")]
    #[sqlx(rename = "11")]
    #[strum(serialize = "11")]
    Eleven,
    #[serde(rename = "12")]
    #[sqlx(rename = "12")]
    #[strum(serialize = "12")]
    Twelve,
    #[serde(rename = "13")]
    #[sqlx(rename = "13")]
    #[strum(serialize = "13")]
    Thirteen,
}

impl GradeValue {
    pub const ORDER: [GradeValue; 5] = [
        GradeValue::FiveNine,
        GradeValue::Ten,
        GradeValue::Eleven,
        GradeValue::Twelve,
        GradeValue::Thirteen,
    ];

    /// Position of `raw` in [`Self::ORDER`], or -1 when it is not a known band.
    pub fn index_of(raw: &str) -> i32 {
        GradeValue::from_str(raw)
            .ok()
            .and_then(|value| Self::ORDER.iter().position(|v| *v == value))
            .map_or(-1, |i| i as i32)
    }
}

/// Sub-grade letter within a band
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, TS, EnumString, Display,
)]
#[sqlx(type_name = "grade_detail", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GradeDetail {
    A,
    B,
    C,
    D,
}

impl GradeDetail {
    pub const ORDER: [GradeDetail; 4] = [GradeDetail::A, GradeDetail::B, GradeDetail::C, GradeDetail::D];

    /// Position of `raw` in [`Self::ORDER`], or -1 when it is not a known letter.
    pub fn index_of(raw: &str) -> i32 {
        GradeDetail::from_str(raw)
            .ok()
            .and_then(|detail| Self::ORDER.iter().position(|d| *d == detail))
            .map_or(-1, |i| i as i32)
    }
}

/// Display label for a stored wall type; unknown values pass through as-is.
pub fn wall_type_label(raw: &str) -> String {
    WallType::from_str(raw)
        .map(|w| w.label().to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn format_grade(value: &str, detail: &str) -> String {
    format!("{value}-{detail}")
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Route {
    pub id: Uuid,
    pub wall_type: String,
    pub grade_value: Option<String>,
    pub grade_detail: Option<String>,
    pub name: String,
    pub hold_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateRoute {
    pub wall_type: WallType,
    pub grade_value: GradeValue,
    pub grade_detail: GradeDetail,
    pub name: String,
    pub hold_count: i64,
}

impl Route {
    pub fn wall_type_label(&self) -> String {
        wall_type_label(&self.wall_type)
    }

    /// Formatted grade, `None` when either half is missing.
    pub fn grade(&self) -> Option<String> {
        match (&self.grade_value, &self.grade_detail) {
            (Some(value), Some(detail)) => Some(format_grade(value, detail)),
            _ => None,
        }
    }

    pub async fn create(pool: &SqlitePool, data: &CreateRoute) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Route>(
            r#"INSERT INTO routes (id, wall_type, grade_value, grade_detail, name, hold_count)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, wall_type, grade_value, grade_detail, name, hold_count, created_at"#,
        )
        .bind(id)
        .bind(data.wall_type)
        .bind(data.grade_value)
        .bind(data.grade_detail)
        .bind(data.name.trim())
        .bind(data.hold_count)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Route>(
            r#"SELECT id, wall_type, grade_value, grade_detail, name, hold_count, created_at
               FROM routes
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Route>(
            r#"SELECT id, wall_type, grade_value, grade_detail, name, hold_count, created_at
               FROM routes
               ORDER BY created_at DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
