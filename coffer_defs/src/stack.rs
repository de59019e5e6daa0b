use serde::{Deserialize, Serialize};

use crate::id::ItemId;

/// Quantity of a single kind of item. Signed so merge arithmetic can pass
/// through negative intermediates; the ledger itself never stores one.
pub type ItemAmount = i64;

/// A fully resolved (id, amount) record.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: ItemId,
    pub amount: ItemAmount,
}
