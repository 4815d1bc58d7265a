use std::fs::create_dir_all;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel::{Connection, SqliteConnection};

pub struct Conn(SqliteConnection);

impl Drop for Conn {
    fn drop(&mut self) {
        // if this fails, we don't really care at this point
        // the goal is just to have the optimize pragma run when the request
        // ends, so that it can potentially update some of the tables based on
        // the queries used during this request.
        // See: https://sqlite.org/pragma.html#pragma_optimize
        let _ = self.0.batch_execute("PRAGMA optimize;");
    }
}

impl Deref for Conn {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Conn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

pub fn establish_connection(
    database_url: impl AsRef<Path>,
    busy_timeout: Duration,
) -> Result<Conn> {
    let database_url = database_url.as_ref();

    // The database and potentially its parent folders may not yet exist.  SQLite can handle
    // creating the file fine, but we need to make sure all of the parent folders also exist.
    if let Some(parent) = database_url.parent() {
        create_dir_all(parent)?;
    }

    // SQLite only accepts utf-8 or utf-16 paths, so a non-utf-8 path is converted lossily here.
    // See: https://github.com/diesel-rs/diesel/discussions/3069
    let database_url = database_url.to_string_lossy();

    log::trace!("Connecting to SQLite DB at {database_url}");
    let mut conn = SqliteConnection::establish(&database_url)?;
    // busy_timeout lets a request wait for another request's write transaction to finish
    // instead of failing straight away with SQLITE_BUSY.
    conn.batch_execute(&format!(
        "PRAGMA foreign_keys = TRUE;
        PRAGMA ignore_check_constraints = FALSE;
        PRAGMA busy_timeout = {};",
        busy_timeout.as_millis()
    ))?;
    log::trace!("Connection to SQLite DB successful");
    Ok(Conn(conn))
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS time_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects (id),
    start_time TIMESTAMP NOT NULL,
    end_time TIMESTAMP
);
CREATE INDEX IF NOT EXISTS time_entries_start_time ON time_entries (start_time);
";

/// Creates the tables if they are missing.  Safe to run against an existing database.
pub fn ensure_schema(conn: &mut SqliteConnection) -> Result<()> {
    conn.batch_execute(SCHEMA)?;
    log::trace!("SQLite DB schema is in place");
    Ok(())
}

#[derive(Queryable, Identifiable, Selectable, Debug, PartialEq, Clone)]
#[diesel(table_name = super::schema::projects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Project {
    pub id: i32,
    pub name: String,
}

#[derive(Queryable, Identifiable, Selectable, Associations, Debug, PartialEq, Clone)]
#[diesel(table_name = super::schema::time_entries)]
#[diesel(belongs_to(Project))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TimeEntry {
    pub id: i32,
    pub project_id: i32,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
}

pub fn upsert_project(conn: &mut SqliteConnection, project_name: &str) -> Result<Project> {
    use super::schema::projects;

    let project = diesel::insert_into(projects::table)
        .values(projects::name.eq(project_name))
        .on_conflict(projects::name)
        .do_update()
        // "updates" the project name to itself - this should be a no-op, but allows us to use
        // the returning clause to fetch the project ID and other details.
        .set(projects::name.eq(excluded(projects::name)))
        .returning(Project::as_returning())
        .get_result(conn)?;
    Ok(project)
}

/// Sets the end time of every running entry, returning how many were closed.
pub fn close_open_entries(
    conn: &mut SqliteConnection,
    timestamp: NaiveDateTime,
) -> Result<usize> {
    use super::schema::time_entries;

    let count = diesel::update(time_entries::table.filter(time_entries::end_time.is_null()))
        .set(time_entries::end_time.eq(Some(timestamp)))
        .execute(conn)?;
    Ok(count)
}

pub fn count_open_entries(conn: &mut SqliteConnection) -> Result<i64> {
    use super::schema::time_entries;

    Ok(time_entries::table
        .filter(time_entries::end_time.is_null())
        .count()
        .get_result(conn)?)
}

pub fn insert_entry(
    conn: &mut SqliteConnection,
    project_id: i32,
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
) -> Result<TimeEntry> {
    use super::schema::time_entries;

    let entry = diesel::insert_into(time_entries::table)
        .values((
            time_entries::project_id.eq(project_id),
            time_entries::start_time.eq(start_time),
            time_entries::end_time.eq(end_time),
        ))
        .returning(TimeEntry::as_returning())
        .get_result(conn)?;
    Ok(entry)
}

pub type EntryTuple = (TimeEntry, Project);

pub fn query_entries_all(conn: &mut SqliteConnection) -> Result<Vec<EntryTuple>> {
    use super::schema::projects;
    use super::schema::time_entries;

    Ok(time_entries::table
        .inner_join(projects::table)
        .select((TimeEntry::as_select(), Project::as_select()))
        .order((time_entries::start_time, time_entries::id))
        .load(conn)?)
}

/// Entries that started in the half-open range `[from, until)`.
pub fn query_entries_between(
    conn: &mut SqliteConnection,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> Result<Vec<EntryTuple>> {
    use super::schema::projects;
    use super::schema::time_entries;

    Ok(time_entries::table
        .inner_join(projects::table)
        .filter(time_entries::start_time.ge(from))
        .filter(time_entries::start_time.lt(until))
        .select((TimeEntry::as_select(), Project::as_select()))
        .order((time_entries::start_time, time_entries::id))
        .load(conn)?)
}

#[cfg(test)]
pub fn count_projects(conn: &mut SqliteConnection) -> Result<i64> {
    use super::schema::projects;

    Ok(projects::table.count().get_result(conn)?)
}
