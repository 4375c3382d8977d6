//! Relational schema for the component index.
//!
//! Three dimension tables keyed by their natural key, one `components`
//! table, and a junction table per dimension. The schema version lives in
//! `PRAGMA user_version`.

use rusqlite::Connection;

use crate::db::StoreError;

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS components (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_components_name ON components(name);

CREATE TABLE IF NOT EXISTS interfaces (
    id INTEGER PRIMARY KEY,
    var_name TEXT NOT NULL,
    port_type TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_interfaces_key ON interfaces(var_name, port_type);

CREATE TABLE IF NOT EXISTS params (
    id INTEGER PRIMARY KEY,
    var_name TEXT NOT NULL,
    default_value TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_params_key ON params(var_name, default_value);

CREATE TABLE IF NOT EXISTS composables (
    id INTEGER PRIMARY KEY,
    var_name TEXT NOT NULL,
    composable_type TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_composables_key ON composables(var_name, composable_type);

CREATE TABLE IF NOT EXISTS component_interface_link (
    component_id INTEGER NOT NULL REFERENCES components(id),
    interface_id INTEGER NOT NULL REFERENCES interfaces(id),
    PRIMARY KEY (component_id, interface_id)
);

CREATE TABLE IF NOT EXISTS component_parameter_link (
    component_id INTEGER NOT NULL REFERENCES components(id),
    parameter_id INTEGER NOT NULL REFERENCES params(id),
    PRIMARY KEY (component_id, parameter_id)
);

CREATE TABLE IF NOT EXISTS component_composable_link (
    component_id INTEGER NOT NULL REFERENCES components(id),
    composable_id INTEGER NOT NULL REFERENCES composables(id),
    PRIMARY KEY (component_id, composable_id)
);
"#;

/// Tables in the index, in the order rows are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Table {
    Components,
    Interfaces,
    Params,
    Composables,
    InterfaceLinks,
    ParameterLinks,
    ComposableLinks,
}

impl Table {
    pub const COUNT: usize = 7;

    pub const ALL: [Table; Table::COUNT] = [
        Table::Components,
        Table::Interfaces,
        Table::Params,
        Table::Composables,
        Table::InterfaceLinks,
        Table::ParameterLinks,
        Table::ComposableLinks,
    ];

    /// SQL table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Components => "components",
            Table::Interfaces => "interfaces",
            Table::Params => "params",
            Table::Composables => "composables",
            Table::InterfaceLinks => "component_interface_link",
            Table::ParameterLinks => "component_parameter_link",
            Table::ComposableLinks => "component_composable_link",
        }
    }
}

/// Create the schema on a fresh database, or check the version of an
/// existing one.
pub fn init(conn: &Connection) -> Result<(), StoreError> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version > SCHEMA_VERSION {
        return Err(StoreError::SchemaVersion {
            found: version,
            expected: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(CREATE_TABLES)?;
    if version < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tracing::debug!("initialized index schema v{}", SCHEMA_VERSION);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        for table in Table::ALL {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table.as_str()), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, 0, "{}", table.as_str());
        }
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        assert!(matches!(
            init(&conn),
            Err(StoreError::SchemaVersion { found, .. }) if found == SCHEMA_VERSION + 1
        ));
    }

    #[test]
    fn test_natural_keys_are_unique() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();

        conn.execute(
            "INSERT INTO params (var_name, default_value) VALUES ('voltage', '12')",
            [],
        )
        .unwrap();
        assert!(conn
            .execute(
                "INSERT INTO params (var_name, default_value) VALUES ('voltage', '12')",
                [],
            )
            .is_err());
    }
}
