use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Serialize, Serializer};

use crate::db::{self, SqlitePool, SqlitePooledConn};
use crate::error::{Result, SelfCareError};
use crate::interfaces::scheduler::ScheduledJob;

mod schema;
use schema::reminders;

const REMINDERS_SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    activity TEXT NOT NULL,
    scheduled_time TEXT NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_reminders_scheduled_time ON reminders (scheduled_time);
";

const SCHEDULED_TIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Serialize)]
pub struct Reminder {
    pub id: i32,
    pub activity: String,
    pub scheduled_time: String,
    #[serde(serialize_with = "serialize_flag")]
    pub completed: bool,
}

#[derive(Insertable)]
#[diesel(table_name = reminders)]
struct NewReminder<'a> {
    activity: &'a str,
    scheduled_time: &'a str,
}

pub struct ReminderStore {
    pool: SqlitePool,
}

impl ReminderStore {
    pub async fn new(sqlite_path: impl AsRef<str>) -> Result<Self> {
        let sqlite_path = sqlite_path.as_ref();
        db::ensure_parent_dir(sqlite_path)?;
        db::run_schema(sqlite_path, REMINDERS_SCHEMA_SQL).await?;

        let pool = db::build_pool(sqlite_path).await?;
        Ok(Self { pool })
    }

    /// All reminders, latest `scheduled_time` first.
    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let mut conn = self.conn().await?;
        reminders::table
            .order((reminders::scheduled_time.desc(), reminders::id.desc()))
            .load::<Reminder>(&mut conn)
            .await
            .map_err(|e| SelfCareError::Storage(e.to_string()))
    }

    pub async fn create_reminder(&self, activity: &str, scheduled_time: &str) -> Result<i32> {
        if activity.trim().is_empty() {
            return Err(SelfCareError::Validation(
                "activity must not be empty".to_string(),
            ));
        }
        if scheduled_time.trim().is_empty() {
            return Err(SelfCareError::Validation(
                "scheduled_time must not be empty".to_string(),
            ));
        }

        let new = NewReminder {
            activity,
            scheduled_time,
        };
        let mut conn = self.conn().await?;
        diesel::insert_into(reminders::table)
            .values(&new)
            .returning(reminders::id)
            .get_result::<i32>(&mut conn)
            .await
            .map_err(|e| SelfCareError::Storage(e.to_string()))
    }

    /// Returns whether a row was removed. Absent ids are not an error.
    pub async fn delete_reminder(&self, id: i32) -> Result<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(reminders::table.filter(reminders::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(|e| SelfCareError::Storage(e.to_string()))?;
        Ok(deleted > 0)
    }

    /// Marks incomplete reminders whose time has passed as completed.
    /// Rows with an unparseable `scheduled_time` are left alone.
    pub async fn complete_overdue(&self, now: NaiveDateTime) -> Result<usize> {
        let mut conn = self.conn().await?;
        let open: Vec<Reminder> = reminders::table
            .filter(reminders::completed.eq(false))
            .load(&mut conn)
            .await
            .map_err(|e| SelfCareError::Storage(e.to_string()))?;

        let ids: Vec<i32> = open
            .iter()
            .filter(|reminder| {
                parse_scheduled_time(&reminder.scheduled_time).is_some_and(|due| due <= now)
            })
            .map(|reminder| reminder.id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        diesel::update(reminders::table.filter(reminders::id.eq_any(&ids)))
            .set(reminders::completed.eq(true))
            .execute(&mut conn)
            .await
            .map_err(|e| SelfCareError::Storage(e.to_string()))
    }

    async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        db::checkout(&self.pool).await
    }
}

/// Parses the ISO-8601 shapes browsers and clients usually send.
/// Offsets are converted to local wall-clock time.
pub fn parse_scheduled_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local).naive_local());
    }
    SCHEDULED_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

fn serialize_flag<S>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

pub struct OverdueSweepJob {
    store: Arc<ReminderStore>,
    interval: Duration,
}

impl OverdueSweepJob {
    pub fn new(store: Arc<ReminderStore>, interval: Duration) -> Self {
        Self { store, interval }
    }
}

#[async_trait::async_trait]
impl ScheduledJob for OverdueSweepJob {
    fn name(&self) -> &str {
        "overdue_sweep"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> Result<()> {
        let completed = self
            .store
            .complete_overdue(Local::now().naive_local())
            .await?;
        if completed > 0 {
            tracing::info!(completed, "Marked overdue reminders as completed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_scheduled_time, ReminderStore};
    use crate::error::SelfCareError;
    use chrono::NaiveDate;

    async fn temp_store() -> (tempfile::TempDir, ReminderStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("reminders.db");
        let db_path = db_path.to_string_lossy().to_string();
        let store = ReminderStore::new(&db_path).await.expect("store");
        (dir, store)
    }

    #[tokio::test]
    async fn created_reminder_is_listed_as_not_completed() {
        let (_dir, store) = temp_store().await;

        let id = store
            .create_reminder("Meditate", "2024-01-01T08:00:00")
            .await
            .expect("create");
        assert_eq!(id, 1);

        let items = store.list_reminders().await.expect("list");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[0].activity, "Meditate");
        assert_eq!(items[0].scheduled_time, "2024-01-01T08:00:00");
        assert!(!items[0].completed);
    }

    #[tokio::test]
    async fn list_is_ordered_by_scheduled_time_descending() {
        let (_dir, store) = temp_store().await;

        store
            .create_reminder("Stretch", "2024-03-01T09:00:00")
            .await
            .expect("create stretch");
        store
            .create_reminder("Journal", "2024-05-01T21:00:00")
            .await
            .expect("create journal");
        store
            .create_reminder("Walk", "2024-01-15T12:30:00")
            .await
            .expect("create walk");

        let items = store.list_reminders().await.expect("list");
        let activities: Vec<&str> = items.iter().map(|r| r.activity.as_str()).collect();
        assert_eq!(activities, vec!["Journal", "Stretch", "Walk"]);
    }

    #[tokio::test]
    async fn ordering_compares_stored_text_then_newest_id() {
        let (_dir, store) = temp_store().await;

        store
            .create_reminder("Later, space separated", "2024-01-01 09:00")
            .await
            .expect("space");
        store
            .create_reminder("Earlier, T separated", "2024-01-01T08:00")
            .await
            .expect("t");
        let first_tie = store
            .create_reminder("Tie one", "2023-06-01T10:00:00")
            .await
            .expect("tie one");
        let second_tie = store
            .create_reminder("Tie two", "2023-06-01T10:00:00")
            .await
            .expect("tie two");

        let items = store.list_reminders().await.expect("list");
        let activities: Vec<&str> = items.iter().map(|r| r.activity.as_str()).collect();
        assert_eq!(
            activities,
            vec![
                "Earlier, T separated",
                "Later, space separated",
                "Tie two",
                "Tie one"
            ]
        );
        assert!(second_tie > first_tie);
    }

    #[tokio::test]
    async fn delete_removes_only_the_target_row() {
        let (_dir, store) = temp_store().await;

        let first = store
            .create_reminder("Hydrate", "2024-01-01T10:00:00")
            .await
            .expect("first");
        let second = store
            .create_reminder("Read", "2024-01-02T10:00:00")
            .await
            .expect("second");

        assert!(store.delete_reminder(first).await.expect("delete"));

        let items = store.list_reminders().await.expect("list");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, second);
    }

    #[tokio::test]
    async fn deleting_absent_id_is_a_no_op() {
        let (_dir, store) = temp_store().await;
        store
            .create_reminder("Hydrate", "2024-01-01T10:00:00")
            .await
            .expect("create");

        let removed = store.delete_reminder(999).await.expect("delete absent");
        assert!(!removed);
        assert_eq!(store.list_reminders().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let (_dir, store) = temp_store().await;

        let first = store
            .create_reminder("Nap", "2024-01-01T14:00:00")
            .await
            .expect("first");
        store.delete_reminder(first).await.expect("delete");
        let second = store
            .create_reminder("Nap", "2024-01-01T14:00:00")
            .await
            .expect("second");
        assert!(second > first);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let (_dir, store) = temp_store().await;

        let err = store
            .create_reminder("   ", "2024-01-01T08:00:00")
            .await
            .unwrap_err();
        assert!(matches!(err, SelfCareError::Validation(_)));

        let err = store.create_reminder("Meditate", "").await.unwrap_err();
        assert!(matches!(err, SelfCareError::Validation(_)));

        assert!(store.list_reminders().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn complete_overdue_marks_only_past_parseable_rows() {
        let (_dir, store) = temp_store().await;

        store
            .create_reminder("Past", "2024-01-01T08:00:00")
            .await
            .expect("past");
        store
            .create_reminder("Future", "2099-01-01T08:00:00")
            .await
            .expect("future");
        store
            .create_reminder("Whenever", "after lunch")
            .await
            .expect("free text");

        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date");
        let completed = store.complete_overdue(now).await.expect("sweep");
        assert_eq!(completed, 1);

        let items = store.list_reminders().await.expect("list");
        for item in items {
            assert_eq!(item.completed, item.activity == "Past", "{}", item.activity);
        }

        assert_eq!(store.complete_overdue(now).await.expect("second sweep"), 0);
    }

    #[test]
    fn parses_common_iso_shapes() {
        assert!(parse_scheduled_time("2024-01-01T08:00:00").is_some());
        assert!(parse_scheduled_time("2024-01-01T08:00").is_some());
        assert!(parse_scheduled_time("2024-01-01 08:00:00.250").is_some());
        assert!(parse_scheduled_time("2024-01-01T08:00:00Z").is_some());
        assert!(parse_scheduled_time("tomorrow morning").is_none());
    }

    #[test]
    fn completed_serializes_as_integer_flag() {
        let reminder = super::Reminder {
            id: 1,
            activity: "Meditate".to_string(),
            scheduled_time: "2024-01-01T08:00:00".to_string(),
            completed: false,
        };
        let value = serde_json::to_value(&reminder).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1,
                "activity": "Meditate",
                "scheduled_time": "2024-01-01T08:00:00",
                "completed": 0
            })
        );
    }
}
