use crate::Database;
use crate::models::{NewTask, TaskRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Tasks --

    pub fn insert_task(&self, task: &NewTask<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, title, description, filename, original_name, mimetype)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    task.id,
                    task.title,
                    task.description,
                    task.filename,
                    task.original_name,
                    task.mimetype,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_task(&self, id: &str) -> Result<Option<TaskRow>> {
        self.with_conn(|conn| query_task_by_id(conn, id))
    }
}

fn query_task_by_id(conn: &Connection, id: &str) -> Result<Option<TaskRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, filename, original_name, mimetype, uploaded_at
         FROM tasks WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(TaskRow {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                filename: row.get(3)?,
                original_name: row.get(4)?,
                mimetype: row.get(5)?,
                uploaded_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
