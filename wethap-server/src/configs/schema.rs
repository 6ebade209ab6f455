use crate::models::Table;
use crate::models::{InfoTable, ManualInfoTable, SenderTable};

pub struct SchemaManager {
    tables: Vec<Box<dyn Table>>,
}

impl SchemaManager {
    pub fn new(mut tables: Vec<Box<dyn Table>>) -> Self {
        Self::sort_tables(&mut tables);
        Self { tables }
    }

    /// Orders tables so that every table comes after the ones it references.
    fn sort_tables(tables: &mut Vec<Box<dyn Table>>) {
        let mut pending = std::mem::take(tables);

        while !pending.is_empty() {
            let ready = pending.iter().position(|table| {
                table
                    .dependencies()
                    .iter()
                    .all(|dep| tables.iter().any(|sorted| sorted.name() == *dep))
            });

            let index = ready.expect("Circular dependency detected or unresolved dependencies exist.");
            tables.push(pending.remove(index));
        }
    }

    pub fn table_names(&self) -> Vec<&'static str> {
        self.tables.iter().map(|table| table.name()).collect()
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(vec![
            Box::new(SenderTable),
            Box::new(InfoTable),
            Box::new(ManualInfoTable),
        ])
    }
}
