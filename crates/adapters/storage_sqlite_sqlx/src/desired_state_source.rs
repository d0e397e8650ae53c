//! `SQLite` implementation of [`DesiredStateSource`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use ledbridge_app::ports::DesiredStateSource;
use ledbridge_domain::error::BridgeError;
use ledbridge_domain::id::{OutputId, PhysicalLine};
use ledbridge_domain::output::DesiredState;

use crate::error::StorageError;
use crate::state_value;

/// A `leds` row as stored, before any validation.
struct Wrapper {
    id: i64,
    label: String,
    line: i64,
    state: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            label: row.try_get("label")?,
            line: row.try_get("line")?,
            state: row.try_get("state")?,
        })
    }
}

/// Why a stored row cannot be used.
#[derive(Debug, thiserror::Error)]
enum RowError {
    #[error("id {0} is not a valid output id")]
    Id(i64),
    #[error("line {0} is not a valid physical line")]
    Line(i64),
    #[error("state is missing")]
    MissingState,
    #[error(transparent)]
    State(#[from] ledbridge_domain::error::ValidationError),
}

impl Wrapper {
    fn into_desired(self) -> Result<DesiredState, RowError> {
        let output_id = u32::try_from(self.id)
            .ok()
            .filter(|id| *id > 0)
            .map(OutputId::new)
            .ok_or(RowError::Id(self.id))?;
        let line = u16::try_from(self.line)
            .map(PhysicalLine::new)
            .map_err(|_| RowError::Line(self.line))?;
        let state = state_value::parse(self.state.as_deref().ok_or(RowError::MissingState)?)?;

        Ok(DesiredState {
            output_id,
            label: self.label,
            line,
            state,
        })
    }
}

const SELECT_ALL: &str = "SELECT id, label, line, state FROM leds ORDER BY id";

/// `SQLite`-backed desired-state source.
///
/// Rows that cannot be understood are skipped with a warning; the rest of
/// the set is still returned.
pub struct SqliteDesiredStateSource {
    pool: SqlitePool,
}

impl SqliteDesiredStateSource {
    /// Create a new source using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DesiredStateSource for SqliteDesiredStateSource {
    fn desired_states(
        &self,
    ) -> impl Future<Output = Result<Vec<DesiredState>, BridgeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            let desired = rows
                .into_iter()
                .filter_map(|row| {
                    let id = row.id;
                    row.into_desired()
                        .inspect_err(|err| {
                            tracing::warn!(row = id, error = %err, "skipping unusable row");
                        })
                        .ok()
                })
                .collect();

            Ok(desired)
        }
    }
}
