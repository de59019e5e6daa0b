pub mod bank;

pub use coffer_defs::id::{ItemId, ItemKey, SharedStr};
pub use coffer_defs::stack::{ItemAmount, ItemStack};
pub use coffer_resources::{ItemCatalog, ItemDef, ItemLookup, UnknownItemError};

pub use crate::bank::{Bank, BankInput};
