use hashbrown::HashMap;

use coffer_defs::id::{ItemId, SharedStr};

use crate::drop_table::DropTable;
use crate::item::ItemDef;

/// The loaded data tables. Pure data; loading and lookup live on
/// [`ItemCatalog`](crate::ItemCatalog).
#[derive(Debug, Default, Clone)]
pub struct Registry {
    pub items: HashMap<ItemId, ItemDef>,
    /// Name index into `items`. Every value is a key of `items`.
    pub names: HashMap<SharedStr, ItemId>,
    pub drop_tables: HashMap<SharedStr, DropTable>,
}
