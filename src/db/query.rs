//! Reading projections back out of the index.

use rusqlite::{params, OptionalExtension};

use crate::core::ComponentQueryItem;
use crate::db::{ComponentStore, StoreError};

const INTERFACES_OF: &str = "SELECT i.var_name, i.port_type
     FROM component_interface_link l
     JOIN interfaces i ON i.id = l.interface_id
     WHERE l.component_id = ?1
     ORDER BY l.rowid";

const PARAMS_OF: &str = "SELECT p.var_name, p.default_value
     FROM component_parameter_link l
     JOIN params p ON p.id = l.parameter_id
     WHERE l.component_id = ?1
     ORDER BY l.rowid";

const COMPOSABLES_OF: &str = "SELECT c.var_name, c.composable_type
     FROM component_composable_link l
     JOIN composables c ON c.id = l.composable_id
     WHERE l.component_id = ?1
     ORDER BY l.rowid";

impl ComponentStore {
    /// Rebuild the projection of `name`, or `None` if it was never stored.
    ///
    /// If a component was stored with two values for the same key, the one
    /// from the most recent synchronization wins.
    pub fn query_by_name(&self, name: &str) -> Result<Option<ComponentQueryItem>, StoreError> {
        let conn = self.connection();
        let Some(id) = conn
            .query_row(
                "SELECT id FROM components WHERE name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
        else {
            tracing::debug!("`{}` is not in the index", name);
            return Ok(None);
        };

        let mut item = ComponentQueryItem::new(name);
        item.gen_interfaces(self.pairs(INTERFACES_OF, id)?);
        item.gen_parameters(self.pairs(PARAMS_OF, id)?);
        item.gen_composables(self.pairs(COMPOSABLES_OF, id)?);
        Ok(Some(item))
    }

    /// Every component name in the index, sorted.
    pub fn stored_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .connection()
            .prepare("SELECT name FROM components ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    fn pairs(&self, sql: &str, component_id: i64) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.connection().prepare_cached(sql)?;
        let rows = stmt
            .query_map(params![component_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Component, Composable, HasCapabilities, InterfaceSpec};
    use crate::test_support::fixtures::{motor, servo_mount};

    #[test]
    fn test_unknown_name_is_none() {
        let store = ComponentStore::open_in_memory().unwrap();
        assert!(store.query_by_name("Nope").unwrap().is_none());
    }

    #[test]
    fn test_motor_projection() {
        let mut store = ComponentStore::open_in_memory().unwrap();
        store.synchronize(&motor()).unwrap();

        let item = store.query_by_name("Motor").unwrap().unwrap();
        assert_eq!(item.parameters()["voltage"], "12");
        assert_eq!(item.composables()["code"], "CodeComposable");
        assert!(item.has_capability("code"));
        assert!(!item.has_capability("graph"));
    }

    #[test]
    fn test_composite_matches_live_projection() {
        let mount = servo_mount();
        let mut store = ComponentStore::open_in_memory().unwrap();
        store.synchronize(&mount).unwrap();

        let stored = store.query_by_name("ServoMount").unwrap().unwrap();
        assert_eq!(stored, ComponentQueryItem::project(&mount));
    }

    #[test]
    fn test_names_are_matched_exactly() {
        let mut store = ComponentStore::open_in_memory().unwrap();
        for name in ["50%_Gear", "O'Brien \"Arm\"", "a_b"] {
            let mut c = Component::new(name);
            c.add_interface("x", InterfaceSpec::port("DataPort"));
            store.synchronize(&c).unwrap();
        }

        assert!(store.query_by_name("50%_Gear").unwrap().is_some());
        assert!(store.query_by_name("O'Brien \"Arm\"").unwrap().is_some());
        // LIKE-style wildcards must not match anything else
        assert!(store.query_by_name("50%").unwrap().is_none());
        assert!(store.query_by_name("a%").unwrap().is_none());
        assert!(store.query_by_name("axb").unwrap().is_none());
    }

    #[test]
    fn test_last_write_wins_per_key() {
        let mut store = ComponentStore::open_in_memory().unwrap();
        let mut first = Component::new("Lamp");
        first.add_composable("code", Composable::code("arduino"));
        store.synchronize(&first).unwrap();

        let mut second = Component::new("Lamp");
        second.add_composable("code", Composable::VirtualComposable);
        store.synchronize(&second).unwrap();

        let item = store.query_by_name("Lamp").unwrap().unwrap();
        assert_eq!(item.composables()["code"], "VirtualComposable");
    }

    #[test]
    fn test_resync_to_earlier_value_wins() {
        let mut store = ComponentStore::open_in_memory().unwrap();
        for voltage in [12, 24, 12] {
            let mut m = motor();
            m.set_parameter("voltage", voltage);
            store.synchronize(&m).unwrap();
        }

        let item = store.query_by_name("Motor").unwrap().unwrap();
        assert_eq!(item.parameters()["voltage"], "12");

        let mut m = motor();
        m.set_parameter("voltage", 24);
        store.synchronize(&m).unwrap();
        let item = store.query_by_name("Motor").unwrap().unwrap();
        assert_eq!(item.parameters()["voltage"], "24");
    }

    #[test]
    fn test_stored_names_sorted() {
        let mut store = ComponentStore::open_in_memory().unwrap();
        store.build_database([&servo_mount(), &motor()]).unwrap();
        assert_eq!(store.stored_names().unwrap(), vec!["Motor", "ServoMount"]);
    }
}
