//! Projecting components into the index.
//!
//! Every dimension row is find-or-create on its natural key: look it up with
//! exact parameterized equality, insert it if absent, reuse its id if
//! present. Junction rows are then re-linked at the end of their table, so a
//! query folds the most recent pass last. Running a component through twice
//! leaves the row counts unchanged.

use std::fmt;

use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, ToSql, Transaction, TransactionBehavior,
};

use crate::core::Component;
use crate::db::schema::Table;
use crate::db::{ComponentStore, StoreError};

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    counts: [u64; Table::COUNT],
}

/// Rows inserted by a synchronization pass.
pub type SyncReport = TableCounts;

impl TableCounts {
    pub fn get(&self, table: Table) -> u64 {
        self.counts[table as usize]
    }

    fn add(&mut self, table: Table, n: u64) {
        self.counts[table as usize] += n;
    }

    fn record(&mut self, table: Table, inserted: bool) {
        if inserted {
            self.add(table, 1);
        }
    }

    /// Sum over all tables.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Add another report's counts to this one.
    pub fn merge(&mut self, other: &TableCounts) {
        for table in Table::ALL {
            self.add(table, other.get(table));
        }
    }
}

impl fmt::Display for TableCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, table) in Table::ALL.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", table.as_str(), self.get(*table))?;
        }
        Ok(())
    }
}

/// The flattened rows of one component, computed before any write.
struct Rows {
    name: String,
    interfaces: Vec<(String, String)>,
    params: Vec<(String, String)>,
    composables: Vec<(String, String)>,
}

impl Rows {
    fn flatten(component: &Component) -> Result<Self, StoreError> {
        let mut interfaces = Vec::with_capacity(component.interfaces().len());
        for name in component.interfaces().keys() {
            // Delegates are stored under the port type they resolve to
            let port_type = component.resolve_interface(name)?;
            interfaces.push((name.clone(), port_type.as_str().to_string()));
        }

        Ok(Rows {
            name: component.name().to_string(),
            interfaces,
            params: component
                .parameters()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
            composables: component
                .composables()
                .iter()
                .map(|(k, c)| (k.clone(), c.type_name().to_string()))
                .collect(),
        })
    }
}

impl ComponentStore {
    /// Write one component into the index in its own transaction.
    pub fn synchronize(&mut self, component: &Component) -> Result<SyncReport, StoreError> {
        let rows = Rows::flatten(component)?;
        let conn = &mut self.conn;
        let report = self.retry.run(|| write_rows(conn, &rows))?;
        tracing::debug!("synchronized `{}`: {}", rows.name, report);
        Ok(report)
    }

    /// Synchronize every component in order, summing the reports.
    ///
    /// Components are not deduplicated, and each runs in its own
    /// transaction: a failure leaves the components before it committed.
    pub fn build_database<'c, I>(&mut self, components: I) -> Result<SyncReport, StoreError>
    where
        I: IntoIterator<Item = &'c Component>,
    {
        let mut total = SyncReport::default();
        let mut passes = 0usize;
        for component in components {
            total.merge(&self.synchronize(component)?);
            passes += 1;
        }
        tracing::info!("synchronized {} components, inserted {} rows", passes, total.total());
        Ok(total)
    }

    /// Current row count of every table.
    pub fn row_counts(&self) -> Result<TableCounts, StoreError> {
        let mut counts = TableCounts::default();
        for table in Table::ALL {
            let n: i64 = self.connection().query_row(
                &format!("SELECT COUNT(*) FROM {}", table.as_str()),
                [],
                |row| row.get(0),
            )?;
            counts.add(table, n as u64);
        }
        Ok(counts)
    }
}

fn write_rows(conn: &mut Connection, rows: &Rows) -> rusqlite::Result<SyncReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut report = SyncReport::default();

    let (component_id, created) = find_or_create(
        &tx,
        "SELECT id FROM components WHERE name = ?1",
        "INSERT INTO components (name) VALUES (?1)",
        params![rows.name],
    )?;
    report.record(Table::Components, created);

    for (name, port_type) in &rows.interfaces {
        let (id, created) = find_or_create(
            &tx,
            "SELECT id FROM interfaces WHERE var_name = ?1 AND port_type = ?2",
            "INSERT INTO interfaces (var_name, port_type) VALUES (?1, ?2)",
            params![name, port_type],
        )?;
        report.record(Table::Interfaces, created);
        report.record(
            Table::InterfaceLinks,
            link(&tx, Table::InterfaceLinks, "interface_id", component_id, id)?,
        );
    }

    for (name, value) in &rows.params {
        let (id, created) = find_or_create(
            &tx,
            "SELECT id FROM params WHERE var_name = ?1 AND default_value = ?2",
            "INSERT INTO params (var_name, default_value) VALUES (?1, ?2)",
            params![name, value],
        )?;
        report.record(Table::Params, created);
        report.record(
            Table::ParameterLinks,
            link(&tx, Table::ParameterLinks, "parameter_id", component_id, id)?,
        );
    }

    for (key, composable_type) in &rows.composables {
        let (id, created) = find_or_create(
            &tx,
            "SELECT id FROM composables WHERE var_name = ?1 AND composable_type = ?2",
            "INSERT INTO composables (var_name, composable_type) VALUES (?1, ?2)",
            params![key, composable_type],
        )?;
        report.record(Table::Composables, created);
        report.record(
            Table::ComposableLinks,
            link(&tx, Table::ComposableLinks, "composable_id", component_id, id)?,
        );
    }

    tx.commit()?;
    Ok(report)
}

/// Return the id of the row matching `select`, inserting it if absent.
/// The flag is true when a row was inserted.
fn find_or_create(
    tx: &Transaction<'_>,
    select: &str,
    insert: &str,
    key: &[&dyn ToSql],
) -> rusqlite::Result<(i64, bool)> {
    let lookup = |tx: &Transaction<'_>| tx.query_row(select, key, |row| row.get::<_, i64>(0));

    if let Some(id) = lookup(tx).optional()? {
        tracing::trace!("reusing row {} for `{}`", id, select);
        return Ok((id, false));
    }

    match tx.execute(insert, key) {
        Ok(_) => Ok((tx.last_insert_rowid(), true)),
        // Another writer inserted the same key first
        Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
            tracing::debug!("insert raced on `{}`, looking the row up again", insert);
            Ok((lookup(tx)?, false))
        }
        Err(e) => Err(e),
    }
}

/// Link `component_id` to `other_id`, moving an existing link to the end of
/// the junction table so the latest pass is folded last on query. The flag
/// is true when the link is new.
fn link(
    tx: &Transaction<'_>,
    table: Table,
    column: &str,
    component_id: i64,
    other_id: i64,
) -> rusqlite::Result<bool> {
    let removed = tx.execute(
        &format!(
            "DELETE FROM {} WHERE component_id = ?1 AND {} = ?2",
            table.as_str(),
            column
        ),
        params![component_id, other_id],
    )?;
    tx.execute(
        &format!(
            "INSERT INTO {} (component_id, {}) VALUES (?1, ?2)",
            table.as_str(),
            column
        ),
        params![component_id, other_id],
    )?;
    Ok(removed == 0)
}
