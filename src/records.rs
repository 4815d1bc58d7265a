// SPDX-License-Identifier: MPL-2.0

mod db;
mod schema;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use diesel::SqliteConnection;
use serde::Serialize;

use crate::report::{week_window, ProjectTotals};
pub use db::{Conn, Project, TimeEntry};

/// A handle on the SQLite database file.
///
/// Cloning is cheap.  Every call to [`Database::connect`] opens a fresh connection,
/// which is closed again when the returned [`Conn`] is dropped.
#[derive(Clone, Debug)]
pub struct Database {
    path: Arc<PathBuf>,
    busy_timeout: Duration,
}

impl Database {
    /// Opens the database once, creating the schema if it doesn't exist yet.
    pub fn open(path: impl Into<PathBuf>, busy_timeout: Duration) -> Result<Self> {
        let database = Self {
            path: Arc::new(path.into()),
            busy_timeout,
        };
        let mut conn = database.connect()?;
        db::ensure_schema(&mut conn)?;
        Ok(database)
    }

    pub fn connect(&self) -> Result<Conn> {
        db::establish_connection(self.path.as_path(), self.busy_timeout)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A request that is well-formed but would break the time entry rules.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EntryRejected {
    #[error("end time {end} is before start time {start}")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("a timer is already running, stop it before adding an open entry")]
    TimerAlreadyRunning,
    #[error("an open entry can't start in the future ({start} is after {now})")]
    OpenEntryInFuture {
        start: NaiveDateTime,
        now: NaiveDateTime,
    },
}

pub struct Records<'a> {
    db: &'a mut SqliteConnection,
}

impl<'a> Records<'a> {
    pub fn new(db: &'a mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Starts a timer for the project, stopping whatever timer was running before.
    ///
    /// The project is created if this is the first time its name is seen.  The stopped
    /// timer (if any) ends at exactly the moment the new one starts.
    pub fn start_timer(&mut self, project_name: &str, now: NaiveDateTime) -> Result<StartedTimer> {
        self.db.immediate_transaction(|conn| {
            let project = db::upsert_project(conn, project_name)?;
            let stopped = db::close_open_entries(conn, now)?;
            let entry = db::insert_entry(conn, project.id, now, None)?;
            Ok(StartedTimer {
                project,
                entry,
                stopped,
            })
        })
    }

    /// Stops every running timer, returning how many there were.
    pub fn stop_timer(&mut self, now: NaiveDateTime) -> Result<usize> {
        db::close_open_entries(self.db, now)
    }

    /// Adds an entry with explicit times.  Running timers are left alone.
    ///
    /// An entry without an end time is only accepted when no timer is running, since
    /// it would otherwise become a second running timer.  It also can't start after
    /// `now`, as stopping it would then give it an end before its start.
    pub fn add_entry(
        &mut self,
        project_name: &str,
        start_time: NaiveDateTime,
        end_time: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<Entry> {
        match end_time {
            Some(end) if end < start_time => {
                return Err(EntryRejected::EndBeforeStart {
                    start: start_time,
                    end,
                }
                .into());
            }
            None if start_time > now => {
                return Err(EntryRejected::OpenEntryInFuture {
                    start: start_time,
                    now,
                }
                .into());
            }
            _ => {}
        }

        self.db.immediate_transaction(|conn| {
            if end_time.is_none() && db::count_open_entries(conn)? > 0 {
                return Err(EntryRejected::TimerAlreadyRunning.into());
            }
            let project = db::upsert_project(conn, project_name)?;
            let entry = db::insert_entry(conn, project.id, start_time, end_time)?;
            Ok(Entry::from((entry, project)))
        })
    }

    /// Every entry, oldest first.
    pub fn timeline(&mut self) -> Result<Vec<Entry>> {
        let entries = db::query_entries_all(self.db)?
            .into_iter()
            .map(Entry::from)
            .collect();
        Ok(entries)
    }

    /// Hours per project for entries starting in the calendar week containing `now`.
    pub fn weekly_totals(&mut self, now: NaiveDateTime) -> Result<ProjectTotals> {
        let (week_start, week_end) = week_window(now.date());
        log::trace!("Summing entries between {week_start} and {week_end}");
        let entries = db::query_entries_between(self.db, week_start, week_end)?
            .into_iter()
            .map(Entry::from);
        Ok(ProjectTotals::from_entries(entries, now))
    }

    #[cfg(test)]
    fn open_entries(&mut self) -> Result<i64> {
        db::count_open_entries(self.db)
    }

    #[cfg(test)]
    fn project_count(&mut self) -> Result<i64> {
        db::count_projects(self.db)
    }
}

#[derive(Debug)]
pub struct StartedTimer {
    pub project: Project,
    pub entry: TimeEntry,
    /// number of timers that were running and have now been stopped
    pub stopped: usize,
}

/// A time entry together with the name of its project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: i32,
    pub project_name: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
}

impl Entry {
    pub fn duration(&self, now: NaiveDateTime) -> chrono::Duration {
        self.end_time.unwrap_or(now) - self.start_time
    }
}

impl From<db::EntryTuple> for Entry {
    fn from((entry, project): db::EntryTuple) -> Self {
        Self {
            id: entry.id,
            project_name: project.name,
            start_time: entry.start_time,
            end_time: entry.end_time,
        }
    }
}
