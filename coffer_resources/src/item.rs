use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::Deserialize;

use coffer_defs::id::{ItemId, SharedStr};
use coffer_defs::stack::ItemAmount;

use crate::{load_recursively, ItemCatalog, RON_EXT};

/// One item descriptor. Read-only to the ledger; it only ever borrows
/// these transiently for rendering and name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: SharedStr,
    pub value: ItemAmount,
    pub stackable: bool,
}

static UNKNOWN_ITEM: Lazy<ItemDef> = Lazy::new(|| ItemDef {
    id: ItemId::UNKNOWN,
    name: SharedStr::from("Unknown item"),
    value: 0,
    stackable: false,
});

/// The shared placeholder descriptor returned for ids the catalog doesn't
/// know.
pub fn unknown_item() -> &'static ItemDef {
    &UNKNOWN_ITEM
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemRaw {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub value: ItemAmount,
    #[serde(default = "stackable_default")]
    pub stackable: bool,
}

fn stackable_default() -> bool {
    true
}

impl ItemCatalog {
    fn load_item(&mut self, file: &Path) -> anyhow::Result<()> {
        log::info!("loading item at: {file:?}");

        let raw: ItemRaw = ron::from_str(&read_to_string(file)?)?;

        anyhow::ensure!(raw.id != 0, "item id 0 is reserved");

        self.insert_item(ItemDef {
            id: ItemId::new(raw.id),
            name: SharedStr::from(raw.name),
            value: raw.value,
            stackable: raw.stackable,
        });

        Ok(())
    }

    /// Loads every `.ron` file under `<dir>/items`, recursively.
    pub fn load_items(&mut self, dir: &Path) -> anyhow::Result<()> {
        let items = dir.join("items");

        for file in load_recursively(&items, OsStr::new(RON_EXT)) {
            self.load_item(&file)
                .with_context(|| format!("error loading {file:?}"))?;
        }

        Ok(())
    }
}
