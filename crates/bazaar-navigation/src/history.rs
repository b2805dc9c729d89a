//! Persisted navigation history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::navigator::{check_target, Navigator};
use crate::Result;
use bazaar_storage::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub target: String,
    pub navigated_at: DateTime<Utc>,
}

/// Navigator that writes every target to the `navigation_history` table.
pub struct HistoryNavigator {
    db: Database,
}

impl HistoryNavigator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Most recent navigations, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        Ok(self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, target, navigated_at FROM navigation_history
                 ORDER BY id DESC
                 LIMIT ?1",
            )?;

            let entries: Vec<HistoryEntry> = stmt
                .query_map([limit as i64], |row| {
                    let navigated_str: String = row.get(2)?;
                    let navigated_at = DateTime::parse_from_rfc3339(&navigated_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now());

                    Ok(HistoryEntry {
                        id: row.get(0)?,
                        target: row.get(1)?,
                        navigated_at,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(entries)
        })?)
    }

    /// Last target navigated to, if any
    pub fn current(&self) -> Result<Option<String>> {
        Ok(self.recent(1)?.into_iter().next().map(|entry| entry.target))
    }

    pub fn clear_all(&self) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute("DELETE FROM navigation_history", [])?;
            Ok(())
        })?)
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, target: &str) -> Result<()> {
        check_target(target)?;

        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO navigation_history (target, navigated_at) VALUES (?1, ?2)",
                rusqlite::params![target, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })?;

        tracing::info!(target_path = %target, "Navigated");
        Ok(())
    }
}

impl Clone for HistoryNavigator {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
