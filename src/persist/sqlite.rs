//! SQLite-backed record tables.

use std::path::Path;

use rusqlite::{
    Connection, OptionalExtension, Row, ToSql, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};

use crate::{
    records::{
        Package, PackageDraft, PackagePatch, PackageQuery, PackageView, Resident, ResidentDraft,
        StorageLocation,
    },
    types::{PackageRecordId, PackageStatus, ResidentId, Table, now_ms},
};

use super::{Backend, StoreError, StoreResult};

const PACKAGE_COLUMNS: &str = "id, package_id, description, color, size, notes, resident_id, \
     storage_location_id, status, checked_in_at_ms, checked_in_by, checked_out_at_ms, checked_out_by";

const RESIDENT_COLUMNS: &str = "id, name, house_number, phone, email";

/// SQLite implementation of [`crate::persist::Backend`].
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Opens or creates a database at `path`.
    ///
    /// Enables WAL mode, `synchronous=NORMAL`, and foreign key enforcement.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    fn package_exists(&self, id: PackageRecordId) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM packages WHERE id = ?1", params![id as i64], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }
}

impl Backend for SqliteBackend {
    fn residents(&self) -> StoreResult<Vec<Resident>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESIDENT_COLUMNS} FROM residents ORDER BY name ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], row_to_resident)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn storage_locations(&self) -> StoreResult<Vec<StorageLocation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, location_name FROM storage_locations ORDER BY location_name ASC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StorageLocation {
                id: row.get::<_, i64>(0)? as u64,
                location_name: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn packages(&self, query: &PackageQuery) -> StoreResult<Vec<PackageView>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.package_id, p.description, p.color, p.size, p.notes, p.resident_id, \
                    p.storage_location_id, p.status, p.checked_in_at_ms, p.checked_in_by, \
                    p.checked_out_at_ms, p.checked_out_by, \
                    r.name, r.house_number, s.location_name \
             FROM packages p \
             LEFT JOIN residents r ON r.id = p.resident_id \
             LEFT JOIN storage_locations s ON s.id = p.storage_location_id \
             WHERE (?1 IS NULL OR p.status = ?1) AND (?2 IS NULL OR p.resident_id = ?2) \
             ORDER BY p.checked_in_at_ms DESC, p.id DESC \
             LIMIT ?3",
        )?;

        // SQLite treats a negative LIMIT as unbounded.
        let limit = query.limit.map(|n| n as i64).unwrap_or(-1);
        let rows = stmt.query_map(
            params![query.status, query.resident_id.map(|id| id as i64), limit],
            |row| {
                Ok(PackageView {
                    package: row_to_package(row)?,
                    resident_name: row.get(13)?,
                    resident_house_number: row.get(14)?,
                    location_name: row.get(15)?,
                })
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn insert_resident(&mut self, draft: ResidentDraft) -> StoreResult<Resident> {
        let rec = self.conn.query_row(
            &format!(
                "INSERT INTO residents(name, house_number, phone, email) VALUES (?1, ?2, ?3, ?4) \
                 RETURNING {RESIDENT_COLUMNS}"
            ),
            params![draft.name, draft.house_number, draft.phone, draft.email],
            row_to_resident,
        )?;
        Ok(rec)
    }

    fn update_resident(&mut self, id: ResidentId, draft: ResidentDraft) -> StoreResult<Resident> {
        self.conn
            .query_row(
                &format!(
                    "UPDATE residents SET name = ?2, house_number = ?3, phone = ?4, email = ?5 \
                     WHERE id = ?1 RETURNING {RESIDENT_COLUMNS}"
                ),
                params![id as i64, draft.name, draft.house_number, draft.phone, draft.email],
                row_to_resident,
            )
            .optional()?
            .ok_or(StoreError::NotFound {
                table: Table::Residents,
                id,
            })
    }

    fn delete_resident(&mut self, id: ResidentId) -> StoreResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM residents WHERE id = ?1", params![id as i64])?;
        if removed == 0 {
            return Err(StoreError::NotFound {
                table: Table::Residents,
                id,
            });
        }
        Ok(())
    }

    fn insert_storage_location(&mut self, location_name: String) -> StoreResult<StorageLocation> {
        let rec = self.conn.query_row(
            "INSERT INTO storage_locations(location_name) VALUES (?1) RETURNING id, location_name",
            params![location_name],
            |row| {
                Ok(StorageLocation {
                    id: row.get::<_, i64>(0)? as u64,
                    location_name: row.get(1)?,
                })
            },
        )?;
        Ok(rec)
    }

    fn insert_package(&mut self, draft: PackageDraft) -> StoreResult<Package> {
        let rec = self.conn.query_row(
            &format!(
                "INSERT INTO packages(package_id, description, color, size, notes, resident_id, \
                     storage_location_id, status, checked_in_at_ms, checked_in_by) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
                 RETURNING {PACKAGE_COLUMNS}"
            ),
            params![
                draft.package_id,
                draft.description,
                draft.color,
                draft.size,
                draft.notes,
                draft.resident_id as i64,
                draft.storage_location_id as i64,
                PackageStatus::CheckedIn,
                now_ms() as i64,
                draft.checked_in_by,
            ],
            row_to_package,
        )?;
        Ok(rec)
    }

    fn update_package(
        &mut self,
        id: PackageRecordId,
        patch: PackagePatch,
        expect_status: Option<PackageStatus>,
    ) -> StoreResult<Package> {
        let updated = self
            .conn
            .query_row(
                &format!(
                    "UPDATE packages SET \
                         status = COALESCE(?2, status), \
                         checked_out_at_ms = COALESCE(?3, checked_out_at_ms), \
                         checked_out_by = COALESCE(?4, checked_out_by) \
                     WHERE id = ?1 AND (?5 IS NULL OR status = ?5) \
                     RETURNING {PACKAGE_COLUMNS}"
                ),
                params![
                    id as i64,
                    patch.status,
                    patch.checked_out_at_ms.map(|ts| ts as i64),
                    patch.checked_out_by,
                    expect_status,
                ],
                row_to_package,
            )
            .optional()?;

        match updated {
            Some(rec) => Ok(rec),
            None if self.package_exists(id)? => Err(StoreError::ConditionFailed {
                table: Table::Packages,
                id,
            }),
            None => Err(StoreError::NotFound {
                table: Table::Packages,
                id,
            }),
        }
    }
}

impl ToSql for PackageStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PackageStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err: String| FromSqlError::Other(Box::new(std::io::Error::other(err))))
    }
}

fn row_to_resident(row: &Row<'_>) -> rusqlite::Result<Resident> {
    Ok(Resident {
        id: row.get::<_, i64>(0)? as u64,
        name: row.get(1)?,
        house_number: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
    })
}

/// Maps the first 13 columns, in [`PACKAGE_COLUMNS`] order.
fn row_to_package(row: &Row<'_>) -> rusqlite::Result<Package> {
    Ok(Package {
        id: row.get::<_, i64>(0)? as u64,
        package_id: row.get(1)?,
        description: row.get(2)?,
        color: row.get(3)?,
        size: row.get(4)?,
        notes: row.get(5)?,
        resident_id: row.get::<_, i64>(6)? as u64,
        storage_location_id: row.get::<_, i64>(7)? as u64,
        status: row.get(8)?,
        checked_in_at_ms: row.get::<_, i64>(9)? as u64,
        checked_in_by: row.get(10)?,
        checked_out_at_ms: row.get::<_, Option<i64>>(11)?.map(|ts| ts as u64),
        checked_out_by: row.get(12)?,
    })
}
