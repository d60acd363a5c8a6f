//! Cycle history statistics.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::group_consecutive;
use crate::model::{Cycle, DailyLog};

/// A run of consecutive logged period days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BleedingEpisode {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length: u32,
}

/// Groups logged period days into episodes, oldest first.
pub fn bleeding_episodes(logs: &[DailyLog]) -> Vec<BleedingEpisode> {
    let days: Vec<NaiveDate> = logs.iter().filter(|l| l.is_period_day).map(|l| l.date).collect();

    group_consecutive(&days)
        .into_iter()
        .filter_map(|run| {
            let start = *run.first()?;
            let end = *run.last()?;
            Some(BleedingEpisode {
                start,
                end,
                length: u32::try_from(run.len()).unwrap_or(u32::MAX),
            })
        })
        .collect()
}

/// One cycle in the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStat {
    /// 1-based, oldest first.
    pub cycle_number: u32,
    pub start_date: NaiveDate,
    /// Logged period days from this start up to the next.
    pub period_length: u32,
    /// Days to the next start; `None` for the ongoing cycle.
    pub cycle_length: Option<u32>,
}

/// Per-cycle history and averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStats {
    /// Mean over cycles with at least one logged period day.
    pub average_period_length: f64,
    /// Mean over completed cycles.
    pub average_cycle_length: f64,
    pub cycles: Vec<CycleStat>,
    /// Runs of logged period days, oldest first.
    pub episodes: Vec<BleedingEpisode>,
}

/// Builds statistics from recorded cycles, the current anchor, and logs.
///
/// Cycle starts are the recorded cycle start dates plus `current_start`.
pub fn cycle_stats(cycles: &[Cycle], current_start: Option<NaiveDate>, logs: &[DailyLog]) -> CycleStats {
    let mut starts: Vec<NaiveDate> = cycles.iter().map(|c| c.start_date).chain(current_start).collect();
    starts.sort();
    starts.dedup();

    let stats: Vec<CycleStat> = starts
        .iter()
        .enumerate()
        .map(|(i, start)| {
            let next = starts.get(i + 1).copied();
            let period_days = logs
                .iter()
                .filter(|l| l.is_period_day && l.date >= *start && next.map_or(true, |n| l.date < n))
                .count();

            CycleStat {
                cycle_number: u32::try_from(i + 1).unwrap_or(u32::MAX),
                start_date: *start,
                period_length: u32::try_from(period_days).unwrap_or(u32::MAX),
                cycle_length: next.and_then(|n| u32::try_from((n - *start).num_days()).ok()),
            }
        })
        .collect();

    let period_lengths: Vec<u32> = stats.iter().map(|s| s.period_length).filter(|p| *p > 0).collect();
    let cycle_lengths: Vec<u32> = stats.iter().filter_map(|s| s.cycle_length).collect();

    CycleStats {
        average_period_length: mean(&period_lengths),
        average_cycle_length: mean(&cycle_lengths),
        cycles: stats,
        episodes: bleeding_episodes(logs),
    }
}

fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64
}
