use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::Path;

use anyhow::Context;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use coffer_defs::id::{ItemId, ItemKey, SharedStr};
use coffer_defs::stack::ItemAmount;

use crate::{load_recursively, ItemCatalog, RON_EXT};

/// How many of an item a drop entry yields when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropQuantity {
    Fixed(ItemAmount),
    /// Inclusive on both ends. The bounds may be given in either order;
    /// `roll` sorts them.
    Range(ItemAmount, ItemAmount),
}

impl DropQuantity {
    pub fn roll(self, rng: &mut impl Rng) -> ItemAmount {
        match self {
            DropQuantity::Fixed(amount) => amount,
            DropQuantity::Range(lo, hi) => rng.gen_range(lo.min(hi)..=lo.max(hi)),
        }
    }
}

/// When a drop entry fires. Weights and tertiary odds are declaration
/// only; rolling them belongs to the loot engine, not this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropClass {
    Always,
    Weighted(u32),
    /// Independent 1-in-`n` roll.
    Tertiary(u32),
}

#[derive(Debug, Clone)]
pub struct DropEntry {
    pub item: ItemKey,
    pub quantity: DropQuantity,
    pub class: DropClass,
}

/// Static loot declaration attached to a named source.
#[derive(Debug, Clone)]
pub struct DropTable {
    pub name: SharedStr,
    pub entries: Vec<DropEntry>,
}

impl DropTable {
    pub fn new(name: impl Into<SharedStr>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn always(self, item: impl Into<ItemKey>) -> Self {
        self.always_amount(item, 1)
    }

    pub fn always_amount(mut self, item: impl Into<ItemKey>, amount: ItemAmount) -> Self {
        self.entries.push(DropEntry {
            item: item.into(),
            quantity: DropQuantity::Fixed(amount),
            class: DropClass::Always,
        });
        self
    }

    pub fn weighted(mut self, item: impl Into<ItemKey>, quantity: DropQuantity, weight: u32) -> Self {
        self.entries.push(DropEntry {
            item: item.into(),
            quantity,
            class: DropClass::Weighted(weight),
        });
        self
    }

    pub fn tertiary(mut self, item: impl Into<ItemKey>, quantity: DropQuantity, one_in: u32) -> Self {
        self.entries.push(DropEntry {
            item: item.into(),
            quantity,
            class: DropClass::Tertiary(one_in),
        });
        self
    }

    /// The entries that drop every time, rolled into the record batch the
    /// ledger's `add`/`remove` accept.
    pub fn guaranteed(&self, rng: &mut impl Rng) -> Vec<(ItemKey, ItemAmount)> {
        self.entries
            .iter()
            .filter(|entry| entry.class == DropClass::Always)
            .map(|entry| (entry.item.clone(), entry.quantity.roll(rng)))
            .collect()
    }
}

#[derive(Error, Debug)]
pub enum DropTableError {
    #[error("empty quantity range {0}..={1}")]
    EmptyRange(ItemAmount, ItemAmount),
    #[error("non-positive drop quantity {0}")]
    NonPositiveQuantity(ItemAmount),
}

#[derive(Debug, Clone, Deserialize)]
pub enum ItemKeyRaw {
    Id(u32),
    Name(String),
}

impl From<ItemKeyRaw> for ItemKey {
    fn from(value: ItemKeyRaw) -> Self {
        match value {
            ItemKeyRaw::Id(id) => ItemKey::Id(ItemId::new(id)),
            ItemKeyRaw::Name(name) => ItemKey::Name(SharedStr::from(name)),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum DropQuantityRaw {
    Fixed(ItemAmount),
    Range(ItemAmount, ItemAmount),
}

impl TryFrom<DropQuantityRaw> for DropQuantity {
    type Error = DropTableError;

    fn try_from(value: DropQuantityRaw) -> Result<Self, Self::Error> {
        match value {
            DropQuantityRaw::Fixed(amount) if amount <= 0 => {
                Err(DropTableError::NonPositiveQuantity(amount))
            }
            DropQuantityRaw::Fixed(amount) => Ok(DropQuantity::Fixed(amount)),
            DropQuantityRaw::Range(lo, _) if lo <= 0 => {
                Err(DropTableError::NonPositiveQuantity(lo))
            }
            DropQuantityRaw::Range(lo, hi) if lo > hi => Err(DropTableError::EmptyRange(lo, hi)),
            DropQuantityRaw::Range(lo, hi) => Ok(DropQuantity::Range(lo, hi)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub enum DropClassRaw {
    Always,
    Weighted(u32),
    Tertiary(u32),
}

impl From<DropClassRaw> for DropClass {
    fn from(value: DropClassRaw) -> Self {
        match value {
            DropClassRaw::Always => DropClass::Always,
            DropClassRaw::Weighted(weight) => DropClass::Weighted(weight),
            DropClassRaw::Tertiary(one_in) => DropClass::Tertiary(one_in),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DropEntryRaw {
    pub item: ItemKeyRaw,
    pub quantity: DropQuantityRaw,
    #[serde(default = "always_default")]
    pub class: DropClassRaw,
}

fn always_default() -> DropClassRaw {
    DropClassRaw::Always
}

#[derive(Debug, Clone, Deserialize)]
pub struct DropTableRaw {
    pub name: String,
    pub entries: Vec<DropEntryRaw>,
}

impl TryFrom<DropTableRaw> for DropTable {
    type Error = DropTableError;

    fn try_from(value: DropTableRaw) -> Result<Self, Self::Error> {
        Ok(DropTable {
            name: SharedStr::from(value.name),
            entries: value
                .entries
                .into_iter()
                .map(|entry| {
                    Ok(DropEntry {
                        item: ItemKey::from(entry.item),
                        quantity: DropQuantity::try_from(entry.quantity)?,
                        class: DropClass::from(entry.class),
                    })
                })
                .collect::<Result<_, DropTableError>>()?,
        })
    }
}

impl ItemCatalog {
    fn load_drop_table(&mut self, file: &Path) -> anyhow::Result<()> {
        log::info!("loading drop table at: {file:?}");

        let raw: DropTableRaw = ron::from_str(&read_to_string(file)?)?;

        self.insert_drop_table(DropTable::try_from(raw)?);

        Ok(())
    }

    /// Loads every `.ron` file under `<dir>/drop_tables`, recursively.
    pub fn load_drop_tables(&mut self, dir: &Path) -> anyhow::Result<()> {
        let drop_tables = dir.join("drop_tables");

        for file in load_recursively(&drop_tables, OsStr::new(RON_EXT)) {
            self.load_drop_table(&file)
                .with_context(|| format!("error loading {file:?}"))?;
        }

        Ok(())
    }
}
