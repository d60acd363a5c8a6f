//! Subcommands and their text output.

use std::fmt::Write as _;

use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};
use clap::Subcommand;
use luna_core::calendar::{cycle_progress, week_days, DayMarking, Selection};
use luna_core::model::{Flow, LogPatch, Mood, OnboardingData, DEFAULT_CYCLE_LENGTH};
use luna_core::period_edit::PeriodEditor;
use luna_core::phase::{expected_ovulation_date, predicted_next_period};
use luna_core::recovery::{HomeView, RecoveryAction};
use luna_core::validation::SettingsInput;
use luna_core::AppConfig;
use luna_storage::CycleTracker;

/// Luna subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the profile
    Onboard {
        /// Display name
        #[arg(long, default_value = "")]
        name: String,

        /// First day of the most recent period (YYYY-MM-DD)
        #[arg(long)]
        last_period: NaiveDate,

        /// Average cycle length in days
        #[arg(long, default_value_t = DEFAULT_CYCLE_LENGTH)]
        cycle_length: u32,
    },

    /// Show today's cycle status
    Status,

    /// Record mood, symptoms, notes, or period for a day
    Log {
        /// Day to log (YYYY-MM-DD)
        date: NaiveDate,

        /// Mood (great, good, okay, neutral, bad, awful, love, happy, sad, sick, irritated, tired, libido_high)
        #[arg(long, value_parser = parse_mood)]
        mood: Option<Mood>,

        /// Symptom tag, repeatable
        #[arg(long = "symptom")]
        symptoms: Vec<String>,

        /// Free text
        #[arg(long)]
        notes: Option<String>,

        /// Flow intensity (light, medium, heavy)
        #[arg(long, value_parser = parse_flow)]
        flow: Option<Flow>,

        /// Mark as a period day
        #[arg(long, conflicts_with = "no_period")]
        period: bool,

        /// Unmark as a period day
        #[arg(long)]
        no_period: bool,
    },

    /// Delete the log for a day
    Unlog {
        /// Day to delete (YYYY-MM-DD)
        date: NaiveDate,
    },

    /// Show calendar markings for a month
    Calendar {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,

        /// Highlight a day (YYYY-MM-DD)
        #[arg(long)]
        select: Option<NaiveDate>,
    },

    /// Answer the "has your period started?" prompt
    Recover {
        #[command(subcommand)]
        answer: RecoverAnswer,
    },

    /// Redraw the current period as a date range
    EditPeriod {
        /// First day (YYYY-MM-DD)
        start: NaiveDate,

        /// Last day (YYYY-MM-DD)
        end: NaiveDate,
    },

    /// Change name, last period date, or cycle length
    Settings {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        last_period: Option<NaiveDate>,

        #[arg(long)]
        cycle_length: Option<u32>,
    },

    /// Show cycle history and averages
    Stats,

    /// Show the stored configuration, optionally changing it
    Config {
        /// How many days back a period edit may reach
        #[arg(long)]
        window_days: Option<i64>,
    },

    /// Delete all data
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Answers to the recovery prompt.
#[derive(Subcommand, Debug, Clone)]
pub enum RecoverAnswer {
    /// A period started on DATE
    Started { date: NaiveDate },
    /// No period yet
    #[command(name = "none")]
    NotYet,
}

fn parse_mood(s: &str) -> Result<Mood, String> {
    Mood::parse(s).ok_or_else(|| format!("unknown mood '{s}'"))
}

fn parse_flow(s: &str) -> Result<Flow, String> {
    Flow::parse(s).ok_or_else(|| format!("unknown flow '{s}'"))
}

fn parse_month(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").map_err(|e| format!("invalid month '{s}': {e}"))
}

/// Runs `command` and returns what to print.
pub fn run(tracker: &mut CycleTracker, command: Command, today: NaiveDate, json: bool) -> anyhow::Result<String> {
    match command {
        Command::Onboard {
            name,
            last_period,
            cycle_length,
        } => {
            let data = OnboardingData {
                name,
                last_period_date: last_period,
                average_cycle_length: cycle_length,
            };
            let profile = tracker.complete_onboarding(&data, today)?;
            Ok(format!("Welcome, {}! Your cycle is being tracked.", profile.name))
        }

        Command::Status => status(tracker, today, json),

        Command::Log {
            date,
            mood,
            symptoms,
            notes,
            flow,
            period,
            no_period,
        } => {
            let mut patch = LogPatch::new();
            if mood.is_some() {
                patch = patch.mood(mood);
            }
            if !symptoms.is_empty() {
                patch = patch.symptoms(Some(symptoms));
            }
            if notes.is_some() {
                patch = patch.notes(notes);
            }
            if flow.is_some() {
                patch = patch.flow(flow);
            }
            if period {
                patch = patch.period_day(true);
            } else if no_period {
                patch = patch.period_day(false);
            }
            if patch.is_empty() {
                bail!("nothing to log: pass --mood, --symptom, --notes, --flow, or --period");
            }

            let log = tracker.logs_mut().upsert_daily_log(date, &patch)?;
            Ok(format!("Logged {}{}", log.date, if log.is_period_day { " (period day)" } else { "" }))
        }

        Command::Unlog { date } => {
            if tracker.logs_mut().delete_daily_log(date)? {
                Ok(format!("Deleted log for {date}"))
            } else {
                Ok(format!("No log for {date}"))
            }
        }

        Command::Calendar { month, select } => {
            let selection = select.map_or(Selection::None, Selection::Day);
            let marks = tracker.calendar(&selection);
            if json {
                return Ok(serde_json::to_string_pretty(&marks.to_json())?);
            }

            let month = month.unwrap_or_else(|| tracker.initial_calendar_date(today));
            let mut out = format!("{}\n", month.format("%B %Y"));
            for (date, marking) in marks
                .iter()
                .filter(|(d, _)| d.year() == month.year() && d.month() == month.month())
            {
                let _ = writeln!(out, "{date}  {}", describe_marking(marking));
            }
            Ok(out.trim_end().to_string())
        }

        Command::Recover { answer } => {
            let action = match answer {
                RecoverAnswer::Started { date } => RecoveryAction::PeriodStarted(date),
                RecoverAnswer::NotYet => RecoveryAction::NoPeriodYet,
            };
            tracker.apply_recovery(action, today)?;
            Ok(match action {
                RecoveryAction::PeriodStarted(_) => {
                    let start = tracker
                        .profile()
                        .get()
                        .and_then(|p| p.last_period_date)
                        .context("profile has no period start")?;
                    format!("New cycle started on {start}")
                }
                RecoveryAction::NoPeriodYet => "Okay, waiting for your next period.".to_string(),
            })
        }

        Command::EditPeriod { start, end } => {
            let mut editor = PeriodEditor::new();
            editor.begin();
            editor.tap(start);
            editor.tap(end);
            let range = tracker.save_period_edit(&mut editor, today)?;
            Ok(format!(
                "Period set to {} - {} ({} days)",
                range.start,
                range.end,
                range.len()
            ))
        }

        Command::Settings {
            name,
            last_period,
            cycle_length,
        } => {
            let profile = tracker.profile().get().context("complete onboarding first")?;
            let input = SettingsInput {
                name: name.unwrap_or_else(|| profile.name.clone()),
                last_period_date: match last_period.or(profile.last_period_date) {
                    Some(date) => date,
                    None => bail!("--last-period is required"),
                },
                average_cycle_length: cycle_length.unwrap_or(profile.average_cycle_length),
            };
            tracker.update_settings(&input, today)?;
            Ok("Settings saved".to_string())
        }

        Command::Stats => {
            let stats = tracker.cycle_stats();
            if json {
                return Ok(serde_json::to_string_pretty(&stats)?);
            }

            let mut out = format!(
                "Average cycle: {:.1} days\nAverage period: {:.1} days\n",
                stats.average_cycle_length, stats.average_period_length
            );
            for cycle in &stats.cycles {
                let length = cycle
                    .cycle_length
                    .map_or_else(|| "ongoing".to_string(), |l| format!("{l} days"));
                let _ = writeln!(
                    out,
                    "#{:<3} {}  period {} days, cycle {}",
                    cycle.cycle_number, cycle.start_date, cycle.period_length, length
                );
            }
            if !stats.episodes.is_empty() {
                out.push_str("Logged periods:\n");
                for episode in &stats.episodes {
                    let _ = writeln!(
                        out,
                        "  {} - {} ({} {})",
                        episode.start,
                        episode.end,
                        episode.length,
                        if episode.length == 1 { "day" } else { "days" }
                    );
                }
            }
            Ok(out.trim_end().to_string())
        }

        Command::Config { window_days } => {
            if let Some(days) = window_days {
                if days < 1 {
                    bail!("--window-days must be at least 1");
                }
                let config = AppConfig {
                    period_edit_window_days: days,
                    ..tracker.config().clone()
                };
                tracker.save_config(config)?;
            }
            Ok(serde_json::to_string_pretty(tracker.config())?)
        }

        Command::Reset { yes } => {
            if !yes {
                bail!("this deletes all data; pass --yes to confirm");
            }
            tracker.reset_all()?;
            Ok("All data deleted".to_string())
        }
    }
}

fn status(tracker: &CycleTracker, today: NaiveDate, json: bool) -> anyhow::Result<String> {
    let view = tracker.home_view(today);

    if json {
        let value = match &view {
            HomeView::Status(status) => serde_json::json!({ "view": "status", "status": status }),
            HomeView::NotOnboarded => serde_json::json!({ "view": "not_onboarded" }),
            HomeView::Waiting => serde_json::json!({ "view": "waiting" }),
            HomeView::RecoveryPrompt => serde_json::json!({ "view": "recovery_prompt" }),
            HomeView::NoPrediction => serde_json::json!({ "view": "no_prediction" }),
        };
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let mut out = String::new();
    match view {
        HomeView::NotOnboarded => {
            return Ok("Not set up yet. Run `luna onboard --last-period <DATE>`.".to_string());
        }
        HomeView::Waiting => {
            out.push_str("Waiting for your next period.\nRun `luna recover started <DATE>` once it starts.\n");
        }
        HomeView::RecoveryPrompt => {
            let last = tracker
                .profile()
                .get()
                .and_then(|p| p.last_period_date)
                .context("profile has no period start")?;
            let _ = writeln!(
                out,
                "It has been {} days since your period started on {last}.\nHas a new period started?\n  luna recover started <DATE>\n  luna recover none",
                (today - last).num_days()
            );
        }
        HomeView::NoPrediction => {
            out.push_str("No prediction available. Log the start of your latest period.\n");
        }
        HomeView::Status(status) => {
            let profile = tracker.profile().get().context("profile missing")?;
            let _ = writeln!(out, "Day {}: {}", status.current_day, status.phase_display_name);
            if let Some(next) = predicted_next_period(profile) {
                let _ = writeln!(
                    out,
                    "Next period in {} days ({next})",
                    status.days_until_next_period
                );
            }
            if let Some(ovulation) = expected_ovulation_date(profile) {
                let _ = writeln!(out, "Expected ovulation: {ovulation}");
            }
            if let Some(days) = tracker.days_until_phase_end(today) {
                let _ = writeln!(out, "Phase ends in {days} days");
            }
            if status.is_pregnancy_possible {
                out.push_str("Fertile window\n");
            }
            let _ = writeln!(
                out,
                "Progress: {:.0}%",
                cycle_progress(status.current_day, profile.average_cycle_length) * 100.0
            );
        }
    }

    out.push_str(&week_strip(tracker, today));
    Ok(out.trim_end().to_string())
}

fn week_strip(tracker: &CycleTracker, today: NaiveDate) -> String {
    week_days(today)
        .iter()
        .map(|day| {
            let glyph = tracker
                .logs()
                .get_daily_log(*day)
                .and_then(|log| log.mood)
                .map_or("·", |mood| mood.emoji());
            let marker = if *day == today { "*" } else { "" };
            format!("{}{} {}", day.format("%a %d"), marker, glyph)
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn describe_marking(marking: &DayMarking) -> String {
    let mut parts = Vec::new();
    if let Some(color) = marking.color {
        parts.push(color.to_string());
    }
    match (marking.starting_day, marking.ending_day) {
        (true, true) => parts.push("[single]".to_string()),
        (true, false) => parts.push("[start".to_string()),
        (false, true) => parts.push("end]".to_string()),
        (false, false) => {}
    }
    if marking.marked {
        parts.push("•".to_string());
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use luna_storage::Database;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tracker() -> CycleTracker {
        CycleTracker::open(Database::in_memory().unwrap()).unwrap()
    }

    fn onboard(tracker: &mut CycleTracker, last: NaiveDate, today: NaiveDate) {
        run(
            tracker,
            Command::Onboard {
                name: "Maria".into(),
                last_period: last,
                cycle_length: 28,
            },
            today,
            false,
        )
        .unwrap();
    }

    #[test]
    fn status_before_onboarding() {
        let mut tracker = tracker();
        let out = run(&mut tracker, Command::Status, date(2025, 10, 5), false).unwrap();
        assert!(out.contains("luna onboard"));
    }

    #[test]
    fn onboard_then_status() {
        let mut tracker = tracker();
        let today = date(2025, 10, 3);
        onboard(&mut tracker, date(2025, 10, 1), today);

        let out = run(&mut tracker, Command::Status, today, false).unwrap();
        assert!(out.contains("Day 3: День 3 менструации"));
        assert!(out.contains("Next period in 25 days (2025-10-29)"));
        assert!(out.contains("Fri 03*"));

        let json = run(&mut tracker, Command::Status, today, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"]["currentDay"], 3);
        assert_eq!(value["status"]["phase"], "menstruation");
    }

    #[test]
    fn log_requires_a_field() {
        let mut tracker = tracker();
        let command = Command::Log {
            date: date(2025, 10, 3),
            mood: None,
            symptoms: vec![],
            notes: None,
            flow: None,
            period: false,
            no_period: false,
        };
        assert!(run(&mut tracker, command, date(2025, 10, 3), false).is_err());
    }

    #[test]
    fn log_and_unlog() {
        let mut tracker = tracker();
        let day = date(2025, 10, 3);
        let command = Command::Log {
            date: day,
            mood: Some(Mood::Happy),
            symptoms: vec!["headache".into()],
            notes: None,
            flow: Some(Flow::Light),
            period: true,
            no_period: false,
        };
        let out = run(&mut tracker, command, day, false).unwrap();
        assert_eq!(out, "Logged 2025-10-03 (period day)");

        let log = tracker.logs().get_daily_log(day).unwrap();
        assert_eq!(log.symptoms.as_deref(), Some(&["headache".to_string()][..]));

        let out = run(&mut tracker, Command::Unlog { date: day }, day, false).unwrap();
        assert_eq!(out, "Deleted log for 2025-10-03");
        assert!(tracker.logs().get_daily_log(day).is_none());
    }

    #[test]
    fn recovery_flow() {
        let mut tracker = tracker();
        onboard(&mut tracker, date(2025, 10, 1), date(2025, 10, 1));
        let today = date(2025, 11, 10);

        let out = run(&mut tracker, Command::Status, today, false).unwrap();
        assert!(out.contains("Has a new period started?"));

        let out = run(
            &mut tracker,
            Command::Recover {
                answer: RecoverAnswer::Started {
                    date: date(2025, 11, 4),
                },
            },
            today,
            false,
        )
        .unwrap();
        assert_eq!(out, "New cycle started on 2025-11-04");
    }

    #[test]
    fn edit_period_and_calendar() {
        let mut tracker = tracker();
        onboard(&mut tracker, date(2025, 10, 1), date(2025, 10, 1));
        let today = date(2025, 10, 20);

        let out = run(
            &mut tracker,
            Command::EditPeriod {
                start: date(2025, 10, 2),
                end: date(2025, 10, 4),
            },
            today,
            false,
        )
        .unwrap();
        assert_eq!(out, "Period set to 2025-10-02 - 2025-10-04 (3 days)");

        let out = run(
            &mut tracker,
            Command::Calendar {
                month: Some(date(2025, 10, 1)),
                select: None,
            },
            today,
            false,
        )
        .unwrap();
        assert!(out.contains("2025-10-02  #FFE4E9 [start"));
        assert!(out.contains("2025-10-04  #FFE4E9 end]"));
    }

    #[test]
    fn reset_needs_confirmation() {
        let mut tracker = tracker();
        onboard(&mut tracker, date(2025, 10, 1), date(2025, 10, 1));

        assert!(run(&mut tracker, Command::Reset { yes: false }, date(2025, 10, 2), false).is_err());
        assert!(tracker.profile().get().is_some());

        run(&mut tracker, Command::Reset { yes: true }, date(2025, 10, 2), false).unwrap();
        assert!(tracker.profile().get().is_none());
    }

    #[test]
    fn config_window_is_saved() {
        let db = Database::in_memory().unwrap();
        let mut tracker = CycleTracker::open(db.clone()).unwrap();

        let command = Command::Config {
            window_days: Some(45),
        };
        let out = run(&mut tracker, command, date(2025, 10, 1), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["period_edit_window_days"], 45);

        let reopened = CycleTracker::open(db).unwrap();
        assert_eq!(reopened.config().period_edit_window_days, 45);

        let bad = Command::Config {
            window_days: Some(0),
        };
        assert!(run(&mut tracker, bad, date(2025, 10, 1), false).is_err());
    }

    #[test]
    fn stats_list_logged_periods() {
        let mut tracker = tracker();
        onboard(&mut tracker, date(2025, 10, 1), date(2025, 10, 1));
        for day in [date(2025, 10, 1), date(2025, 10, 2), date(2025, 10, 5)] {
            tracker
                .logs_mut()
                .upsert_daily_log(day, &LogPatch::new().period_day(true))
                .unwrap();
        }

        let out = run(&mut tracker, Command::Stats, date(2025, 10, 6), false).unwrap();
        assert!(out.contains("Logged periods:"));
        assert!(out.contains("2025-10-01 - 2025-10-02 (2 days)"));
        assert!(out.contains("2025-10-05 - 2025-10-05 (1 day)"));

        let json = run(&mut tracker, Command::Stats, date(2025, 10, 6), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["episodes"][0]["start"], "2025-10-01");
        assert_eq!(value["episodes"][0]["length"], 2);
    }

    #[test]
    fn month_parser() {
        assert_eq!(parse_month("2025-10"), Ok(date(2025, 10, 1)));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_mood("ecstatic").is_err());
    }
}
