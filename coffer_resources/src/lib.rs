use std::ffi::OsStr;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use coffer_defs::id::{ItemId, SharedStr};

pub mod drop_table;
pub mod item;
pub mod registry;

pub use crate::drop_table::DropTable;
pub use crate::item::{unknown_item, ItemDef};
pub use crate::registry::Registry;

pub static RON_EXT: &str = "ron";

pub(crate) fn load_recursively(path: &Path, extension: &OsStr) -> Vec<PathBuf> {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .flatten()
        .filter(|v| v.path().extension() == Some(extension))
        .map(|v| v.path().to_path_buf())
        .collect()
}

#[derive(Error, Debug)]
#[error("no item is named \"{0}\"")]
pub struct UnknownItemError(pub SharedStr);

/// The item-resolution interface the ledger consumes: name to id, id to
/// descriptor. Implemented by [`ItemCatalog`]; tests implement it over
/// in-memory fixtures.
pub trait ItemLookup {
    fn item_def(&self, id: ItemId) -> Option<&ItemDef>;

    fn resolve_name(&self, name: &str) -> Result<ItemId, UnknownItemError>;

    /// Descriptor for display purposes. Ids the catalog doesn't know get
    /// the shared placeholder, so this never fails.
    fn describe(&self, id: ItemId) -> &ItemDef {
        self.item_def(id).unwrap_or_else(|| unknown_item())
    }

    fn item_name(&self, id: ItemId) -> &str {
        self.describe(id).name.as_ref()
    }
}

/// The item catalog: owns the registry, loads it from data files on disk.
#[derive(Default, Clone)]
pub struct ItemCatalog {
    pub registry: Registry,
}

impl Debug for ItemCatalog {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("<item catalog>")
    }
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads everything under a resource root: `<dir>/items` and
    /// `<dir>/drop_tables`.
    pub fn load_all(&mut self, dir: &Path) -> anyhow::Result<()> {
        self.load_items(dir)?;
        self.load_drop_tables(dir)?;

        Ok(())
    }

    /// Registers an item, keeping the name index coherent. On a duplicate
    /// name the first registration wins so the index stays a function.
    pub fn insert_item(&mut self, def: ItemDef) {
        if let Some(existing) = self.registry.names.get(def.name.as_ref()) {
            if *existing != def.id {
                log::warn!(
                    "item name \"{}\" already registered to id {existing}, keeping it",
                    def.name
                );
            }
        } else {
            self.registry.names.insert(def.name.clone(), def.id);
        }

        self.registry.items.insert(def.id, def);
    }

    pub fn insert_drop_table(&mut self, table: DropTable) {
        self.registry.drop_tables.insert(table.name.clone(), table);
    }

    pub fn drop_table(&self, name: &str) -> Option<&DropTable> {
        self.registry.drop_tables.get(name)
    }
}

impl ItemLookup for ItemCatalog {
    fn item_def(&self, id: ItemId) -> Option<&ItemDef> {
        self.registry.items.get(&id)
    }

    fn resolve_name(&self, name: &str) -> Result<ItemId, UnknownItemError> {
        self.registry
            .names
            .get(name)
            .copied()
            .ok_or_else(|| UnknownItemError(SharedStr::from(name)))
    }
}
