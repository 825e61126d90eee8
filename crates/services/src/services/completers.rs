//! Leaderboard of the hardest completed routes for today and this week.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc};
use db::models::{
    completion::CompletionRecord,
    route::{GradeDetail, GradeValue, format_grade, wall_type_label},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use super::completion_source::CompletionSource;

pub const DEFAULT_MAX_COUNT: usize = 3;

/// Shown when a completion has no linked member.
pub const MEMBER_PLACEHOLDER: &str = "-";

/// Inclusive range of calendar dates a leaderboard covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn today(today: NaiveDate) -> Self {
        Self {
            start: today,
            end: today,
        }
    }

    /// Monday of the current week through `today`.
    pub fn this_week(today: NaiveDate) -> Self {
        // Sunday is 6 days after Monday, Monday is 0
        let offset = (today.weekday().num_days_from_sunday() + 6) % 7;
        Self {
            start: today - Days::new(u64::from(offset)),
            end: today,
        }
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Composite difficulty: band index * 10 + letter index, each -1 when unknown.
/// An unknown band ranks below every known grade; an unknown letter only ranks
/// below the known letters of its own band.
pub fn grade_rank(grade_value: &str, grade_detail: &str) -> i32 {
    GradeValue::index_of(grade_value) * 10 + GradeDetail::index_of(grade_detail)
}

/// One leaderboard line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CompleterDisplay {
    pub wall_type_label: String,
    pub route_name: String,
    pub grade: String,
    pub member_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub today: Vec<CompleterDisplay>,
    pub this_week: Vec<CompleterDisplay>,
}

/// Drop records without a graded route, order hardest first and keep the top
/// `max_count`. Equal grades keep the order they were fetched in.
pub fn rank_completers(records: &[CompletionRecord], max_count: usize) -> Vec<CompleterDisplay> {
    let mut ranked: Vec<(i32, &CompletionRecord)> = records
        .iter()
        .filter_map(|record| {
            let (_, value, detail) = record.graded_route()?;
            Some((grade_rank(value, detail), record))
        })
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    ranked
        .into_iter()
        .take(max_count)
        .filter_map(|(_, record)| to_display(record))
        .collect()
}

fn to_display(record: &CompletionRecord) -> Option<CompleterDisplay> {
    let (route, value, detail) = record.graded_route()?;
    Some(CompleterDisplay {
        wall_type_label: wall_type_label(&route.wall_type),
        route_name: route.name.clone(),
        grade: format_grade(value, detail),
        member_name: record
            .member
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_else(|| MEMBER_PLACEHOLDER.to_string()),
    })
}

/// Builds leaderboards from a [`CompletionSource`].
///
/// Fetch failures never reach the caller: they are logged and the affected
/// leaderboard comes back empty, same as a day with no completions.
#[derive(Clone)]
pub struct CompletersService {
    source: Arc<dyn CompletionSource>,
    utc_offset: FixedOffset,
}

impl CompletersService {
    pub fn new(source: Arc<dyn CompletionSource>, utc_offset: FixedOffset) -> Self {
        Self { source, utc_offset }
    }

    /// Calendar date of `now` in the configured offset.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.utc_offset).date_naive()
    }

    pub async fn top_completers_today(&self, max_count: usize) -> Vec<CompleterDisplay> {
        self.top_completers_today_at(Utc::now(), max_count).await
    }

    pub async fn top_completers_today_at(
        &self,
        now: DateTime<Utc>,
        max_count: usize,
    ) -> Vec<CompleterDisplay> {
        let window = DateWindow::today(self.local_date(now));
        self.top_completers_in(window, max_count).await
    }

    pub async fn top_completers_this_week(&self, max_count: usize) -> Vec<CompleterDisplay> {
        self.top_completers_this_week_at(Utc::now(), max_count).await
    }

    pub async fn top_completers_this_week_at(
        &self,
        now: DateTime<Utc>,
        max_count: usize,
    ) -> Vec<CompleterDisplay> {
        let window = DateWindow::this_week(self.local_date(now));
        self.top_completers_in(window, max_count).await
    }

    /// Both leaderboards, fetched concurrently.
    pub async fn leaderboard(&self, max_count: usize) -> Leaderboard {
        self.leaderboard_at(Utc::now(), max_count).await
    }

    pub async fn leaderboard_at(&self, now: DateTime<Utc>, max_count: usize) -> Leaderboard {
        let (today, this_week) = tokio::join!(
            self.top_completers_today_at(now, max_count),
            self.top_completers_this_week_at(now, max_count),
        );
        Leaderboard { today, this_week }
    }

    async fn top_completers_in(&self, window: DateWindow, max_count: usize) -> Vec<CompleterDisplay> {
        match self.source.fetch_completed(window).await {
            Ok(records) => {
                let top = rank_completers(&records, max_count);
                debug!(
                    start = %window.start,
                    end = %window.end,
                    fetched = records.len(),
                    returned = top.len(),
                    "Ranked completers"
                );
                top
            }
            Err(e) => {
                warn!(
                    start = %window.start,
                    end = %window.end,
                    error = %e,
                    "Completer fetch failed, serving empty leaderboard"
                );
                Vec::new()
            }
        }
    }
}
