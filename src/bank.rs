use std::collections::BTreeMap;
use std::ops::Deref;

use rand::seq::IteratorRandom;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use coffer_defs::id::{ItemId, ItemKey, SharedStr};
use coffer_defs::stack::{ItemAmount, ItemStack};
use coffer_resources::item::ItemDef;
use coffer_resources::{ItemLookup, UnknownItemError};

/// The inventory ledger: item id to quantity held.
///
/// Invariant: every stored quantity is strictly positive. Mutations that
/// would leave an entry at or below zero remove it instead; subtraction
/// clamps at zero rather than failing.
///
/// All mutating operations work in place and hand `&mut Self` back for
/// chaining. There is no `DerefMut` and [`values`](Bank::values) borrows
/// shared, so the backing map can only change through these operations.
#[derive(Debug, Default, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct Bank(BTreeMap<ItemId, ItemAmount>);

/// The closed set of input shapes [`Bank::add`], [`Bank::remove`] and
/// [`Bank::has`] accept. Everything funnels through one normalization
/// step ([`resolve`](BankInput::resolve)) before the merge logic runs.
#[derive(Debug, Clone)]
pub enum BankInput {
    ById(ItemId, ItemAmount),
    ByName(SharedStr, ItemAmount),
    /// A batch of records, e.g. resolved loot drops. Each record carries
    /// its own quantity.
    Records(Vec<(ItemKey, ItemAmount)>),
    /// A raw id-to-quantity mapping, merged key by key.
    IdMap(BTreeMap<ItemId, ItemAmount>),
    /// A name-to-quantity mapping; every name is resolved first.
    NameMap(Vec<(SharedStr, ItemAmount)>),
    /// Another ledger, merged in full.
    Ledger(Bank),
}

fn resolve_key(key: ItemKey, items: &impl ItemLookup) -> Result<ItemId, UnknownItemError> {
    match key {
        ItemKey::Id(id) => Ok(id),
        ItemKey::Name(name) => items.resolve_name(&name),
    }
}

impl BankInput {
    /// Normalizes any accepted shape into resolved `(id, amount)` pairs.
    /// Fails on the first name the service cannot resolve.
    fn resolve(self, items: &impl ItemLookup) -> Result<Vec<(ItemId, ItemAmount)>, UnknownItemError> {
        Ok(match self {
            BankInput::ById(id, amount) => vec![(id, amount)],
            BankInput::ByName(name, amount) => vec![(items.resolve_name(&name)?, amount)],
            BankInput::Records(records) => records
                .into_iter()
                .map(|(key, amount)| Ok((resolve_key(key, items)?, amount)))
                .collect::<Result<_, UnknownItemError>>()?,
            BankInput::IdMap(map) => map.into_iter().collect(),
            BankInput::NameMap(map) => map
                .into_iter()
                .map(|(name, amount)| Ok((items.resolve_name(&name)?, amount)))
                .collect::<Result<_, UnknownItemError>>()?,
            BankInput::Ledger(bank) => bank.0.into_iter().collect(),
        })
    }
}

impl From<ItemId> for BankInput {
    fn from(id: ItemId) -> Self {
        BankInput::ById(id, 1)
    }
}

impl From<(ItemId, ItemAmount)> for BankInput {
    fn from((id, amount): (ItemId, ItemAmount)) -> Self {
        BankInput::ById(id, amount)
    }
}

impl From<&str> for BankInput {
    fn from(name: &str) -> Self {
        BankInput::ByName(SharedStr::from(name), 1)
    }
}

impl From<(&str, ItemAmount)> for BankInput {
    fn from((name, amount): (&str, ItemAmount)) -> Self {
        BankInput::ByName(SharedStr::from(name), amount)
    }
}

impl From<ItemKey> for BankInput {
    fn from(key: ItemKey) -> Self {
        BankInput::from((key, 1))
    }
}

impl From<(ItemKey, ItemAmount)> for BankInput {
    fn from((key, amount): (ItemKey, ItemAmount)) -> Self {
        match key {
            ItemKey::Id(id) => BankInput::ById(id, amount),
            ItemKey::Name(name) => BankInput::ByName(name, amount),
        }
    }
}

impl From<Vec<(ItemKey, ItemAmount)>> for BankInput {
    fn from(records: Vec<(ItemKey, ItemAmount)>) -> Self {
        BankInput::Records(records)
    }
}

impl From<Vec<ItemStack>> for BankInput {
    fn from(stacks: Vec<ItemStack>) -> Self {
        BankInput::Records(
            stacks
                .into_iter()
                .map(|stack| (ItemKey::Id(stack.id), stack.amount))
                .collect(),
        )
    }
}

impl From<BTreeMap<ItemId, ItemAmount>> for BankInput {
    fn from(map: BTreeMap<ItemId, ItemAmount>) -> Self {
        BankInput::IdMap(map)
    }
}

impl From<Vec<(SharedStr, ItemAmount)>> for BankInput {
    fn from(map: Vec<(SharedStr, ItemAmount)>) -> Self {
        BankInput::NameMap(map)
    }
}

impl From<Bank> for BankInput {
    fn from(bank: Bank) -> Self {
        BankInput::Ledger(bank)
    }
}

impl Deref for Bank {
    type Target = BTreeMap<ItemId, ItemAmount>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from a raw mapping, dropping non-positive entries
    /// so the invariant holds from the start.
    pub fn from_map(map: BTreeMap<ItemId, ItemAmount>) -> Self {
        Self(map.into_iter().filter(|(_, amount)| *amount > 0).collect())
    }

    pub fn into_inner(self) -> BTreeMap<ItemId, ItemAmount> {
        self.0
    }

    /// The live backing map, for transport and serialization. Shared
    /// borrow only; treat it as a snapshot.
    pub fn values(&self) -> &BTreeMap<ItemId, ItemAmount> {
        &self.0
    }

    pub fn amount_of(&self, id: ItemId) -> ItemAmount {
        self.0.get(&id).copied().unwrap_or(0)
    }

    /// Quantity held of an item. Absent ids and unresolvable names are
    /// simply 0; this never fails.
    pub fn amount(&self, key: impl Into<ItemKey>, items: &impl ItemLookup) -> ItemAmount {
        match key.into() {
            ItemKey::Id(id) => self.amount_of(id),
            ItemKey::Name(name) => items
                .resolve_name(&name)
                .map(|id| self.amount_of(id))
                .unwrap_or(0),
        }
    }

    fn merge(&mut self, id: ItemId, delta: ItemAmount) {
        // amounts may be any integer, so the extremes saturate instead of
        // overflowing
        let total = self.amount_of(id).saturating_add(delta);

        if total > 0 {
            self.0.insert(id, total);
        } else {
            self.0.remove(&id);
        }
    }

    /// Merges `input` into the ledger additively. Amounts may be any
    /// integer; entries left at or below zero are removed. An empty input
    /// is a no-op.
    pub fn add(
        &mut self,
        input: impl Into<BankInput>,
        items: &impl ItemLookup,
    ) -> Result<&mut Self, UnknownItemError> {
        for (id, amount) in input.into().resolve(items)? {
            self.merge(id, amount);
        }

        Ok(self)
    }

    /// Mirrors [`add`](Bank::add) but subtracts. Quantities clamp at
    /// zero: removing more than is held empties the entry, never errs.
    pub fn remove(
        &mut self,
        input: impl Into<BankInput>,
        items: &impl ItemLookup,
    ) -> Result<&mut Self, UnknownItemError> {
        for (id, amount) in input.into().resolve(items)? {
            self.merge(id, amount.saturating_neg());
        }

        Ok(self)
    }

    /// Presence check over the same input shapes as [`add`](Bank::add),
    /// with deliberately asymmetric semantics:
    ///
    /// - single item or a record batch: every listed item merely has to
    ///   be present (quantity > 0), attached quantities are ignored;
    /// - mappings and ledgers: the bank has to hold at least the required
    ///   quantity for every key.
    pub fn has(
        &self,
        input: impl Into<BankInput>,
        items: &impl ItemLookup,
    ) -> Result<bool, UnknownItemError> {
        Ok(match input.into() {
            BankInput::ById(id, _) => self.amount_of(id) > 0,
            BankInput::ByName(name, _) => self.amount_of(items.resolve_name(&name)?) > 0,
            BankInput::Records(records) => {
                for (key, _) in records {
                    if self.amount_of(resolve_key(key, items)?) <= 0 {
                        return Ok(false);
                    }
                }

                true
            }
            sufficiency => {
                for (id, required) in sufficiency.resolve(items)? {
                    if self.amount_of(id) < required {
                        return Ok(false);
                    }
                }

                true
            }
        })
    }

    /// A uniformly chosen entry, by entry rather than by quantity, or
    /// `None` if the ledger is empty.
    pub fn random(&self) -> Option<ItemStack> {
        self.0
            .iter()
            .choose(&mut rand::thread_rng())
            .map(|(id, amount)| ItemStack {
                id: *id,
                amount: *amount,
            })
    }

    /// Scales every quantity by `multiplier`, flooring each product.
    /// Entries that land at or below zero are removed.
    pub fn multiply(&mut self, multiplier: f64) -> &mut Self {
        self.0 = std::mem::take(&mut self.0)
            .into_iter()
            .map(|(id, amount)| (id, (amount as f64 * multiplier).floor() as ItemAmount))
            .filter(|(_, amount)| *amount > 0)
            .collect();

        self
    }

    /// Descriptor-and-quantity pairs in backing-map order (ascending id).
    /// Unknown ids get the placeholder descriptor.
    pub fn items<'a>(&self, items: &'a impl ItemLookup) -> Vec<(&'a ItemDef, ItemAmount)> {
        self.0
            .iter()
            .map(|(id, amount)| (items.describe(*id), *amount))
            .collect()
    }

    pub fn for_each(&self, items: &impl ItemLookup, mut f: impl FnMut(&ItemDef, ItemAmount)) {
        for (id, amount) in &self.0 {
            f(items.describe(*id), *amount);
        }
    }

    /// A new ledger of the entries the predicate keeps, quantities
    /// preserved. The source is left untouched.
    pub fn filter(
        &self,
        items: &impl ItemLookup,
        mut f: impl FnMut(&ItemDef, ItemAmount) -> bool,
    ) -> Bank {
        Bank(
            self.0
                .iter()
                .filter(|(id, amount)| f(items.describe(**id), **amount))
                .map(|(id, amount)| (*id, *amount))
                .collect(),
        )
    }

    /// Renders `"<quantity>x <name>"` entries joined by `", "`, most
    /// plentiful first, ties broken by ascending id. An empty ledger
    /// renders as `"No items"`.
    pub fn display(&self, items: &impl ItemLookup) -> String {
        if self.0.is_empty() {
            return "No items".to_string();
        }

        let mut entries = self
            .0
            .iter()
            .map(|(id, amount)| (*id, *amount))
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        entries
            .into_iter()
            .map(|(id, amount)| format!("{amount}x {}", items.item_name(id)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The wire format is the plain id-to-quantity map; deserialization goes
/// through [`Bank::from_map`], so zero-valued keys can never enter.
impl Serialize for Bank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Bank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::deserialize(deserializer).map(Bank::from_map)
    }
}

#[cfg(test)]
mod tests {
    use coffer_resources::ItemCatalog;

    use super::*;

    fn catalog() -> ItemCatalog {
        let mut catalog = ItemCatalog::new();

        for (id, name) in [(1, "Bones"), (2, "Cowhide"), (3, "Raw beef"), (4, "Coins")] {
            catalog.insert_item(ItemDef {
                id: ItemId::new(id),
                name: SharedStr::from(name),
                value: 1,
                stackable: true,
            });
        }

        catalog
    }

    #[test]
    fn add_then_remove_restores_prior_amount() {
        let items = catalog();
        let mut bank = Bank::new();
        bank.add((ItemId::new(1), 7), &items).unwrap();

        bank.add((ItemId::new(1), 5), &items).unwrap();
        bank.remove((ItemId::new(1), 5), &items).unwrap();

        assert_eq!(bank.amount_of(ItemId::new(1)), 7);
    }

    #[test]
    fn remove_clamps_at_zero_and_drops_the_entry() {
        let items = catalog();
        let mut bank = Bank::new();
        bank.add((ItemId::new(1), 3), &items).unwrap();

        bank.remove((ItemId::new(1), 10), &items).unwrap();

        assert_eq!(bank.amount_of(ItemId::new(1)), 0);
        assert!(!bank.contains_key(&ItemId::new(1)));
        assert_eq!(bank.len(), 0);
    }

    #[test]
    fn empty_map_merge_is_a_noop() {
        let items = catalog();
        let mut bank = Bank::new();
        bank.add(("Bones", 4), &items).unwrap();
        let before = bank.clone();

        bank.add(BTreeMap::new(), &items).unwrap();
        bank.remove(BTreeMap::new(), &items).unwrap();

        assert_eq!(bank, before);
    }

    #[test]
    fn addition_commutes() {
        let items = catalog();
        let a: Vec<(ItemKey, ItemAmount)> =
            vec![(ItemKey::from("Bones"), 3), (ItemKey::from("Cowhide"), 1)];
        let b: Vec<(ItemKey, ItemAmount)> =
            vec![(ItemKey::from("Bones"), 2), (ItemKey::from("Raw beef"), 5)];

        let mut ab = Bank::new();
        ab.add(a.clone(), &items).unwrap().add(b.clone(), &items).unwrap();

        let mut ba = Bank::new();
        ba.add(b, &items).unwrap().add(a, &items).unwrap();

        assert_eq!(ab, ba);
    }

    #[test]
    fn no_zero_entries_survive_any_mutation() {
        let items = catalog();
        let mut bank = Bank::from_map(BTreeMap::from([
            (ItemId::new(1), 5),
            (ItemId::new(2), 0),
            (ItemId::new(3), -4),
        ]));

        assert_eq!(bank.len(), 1);

        bank.add((ItemId::new(2), -3), &items).unwrap();
        bank.remove((ItemId::new(1), 5), &items).unwrap();

        assert!(bank.iter().all(|(_, amount)| *amount > 0));
        assert!(bank.is_empty());
    }

    #[test]
    fn presence_and_sufficiency_differ() {
        let items = catalog();
        let mut bank = Bank::new();
        bank.add((ItemId::new(1), 5), &items).unwrap();

        let listed: Vec<(ItemKey, ItemAmount)> = vec![(ItemKey::Id(ItemId::new(1)), 9999)];
        assert!(bank.has(listed, &items).unwrap());

        assert!(!bank
            .has(BTreeMap::from([(ItemId::new(1), 10)]), &items)
            .unwrap());
        assert!(bank
            .has(BTreeMap::from([(ItemId::new(1), 5)]), &items)
            .unwrap());
    }

    #[test]
    fn has_fails_over_on_any_absent_record() {
        let items = catalog();
        let mut bank = Bank::new();
        bank.add("Bones", &items).unwrap();

        let records: Vec<(ItemKey, ItemAmount)> =
            vec![(ItemKey::from("Bones"), 1), (ItemKey::from("Coins"), 1)];

        assert!(!bank.has(records, &items).unwrap());
    }

    #[test]
    fn ledger_input_merges_and_checks_sufficiency() {
        let items = catalog();
        let mut drops = Bank::new();
        drops.add(("Bones", 2), &items).unwrap();

        let mut bank = Bank::new();
        bank.add(drops.clone(), &items).unwrap();
        bank.add(drops.clone(), &items).unwrap();

        assert_eq!(bank.amount("Bones", &items), 4);
        assert!(bank.has(drops, &items).unwrap());
    }

    #[test]
    fn name_map_input_resolves_every_name() {
        let items = catalog();
        let mut bank = Bank::new();

        bank.add(
            vec![(SharedStr::from("Bones"), 3), (SharedStr::from("Coins"), 100)],
            &items,
        )
        .unwrap();

        assert_eq!(bank.amount_of(ItemId::new(1)), 3);
        assert_eq!(bank.amount_of(ItemId::new(4)), 100);
    }

    #[test]
    fn unknown_names_error_out_of_add_but_not_amount() {
        let items = catalog();
        let mut bank = Bank::new();

        let err = bank.add("Dragon claw", &items).unwrap_err();
        assert_eq!(err.0.as_ref(), "Dragon claw");

        assert_eq!(bank.amount("Dragon claw", &items), 0);
    }

    #[test]
    fn filter_builds_a_new_ledger_without_touching_the_source() {
        let items = catalog();
        let mut bank = Bank::new();
        bank.add(("Bones", 5), &items).unwrap();
        bank.add(("Coins", 100), &items).unwrap();

        let kept = bank.filter(&items, |_, amount| amount >= 100);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept.amount_of(ItemId::new(4)), 100);
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn random_returns_a_held_entry_or_none() {
        let items = catalog();
        let mut bank = Bank::new();

        assert!(bank.random().is_none());

        bank.add(("Bones", 3), &items).unwrap();
        bank.add(("Coins", 100), &items).unwrap();

        for _ in 0..50 {
            let stack = bank.random().unwrap();
            assert_eq!(bank.amount_of(stack.id), stack.amount);
            assert!(stack.amount > 0);
        }
    }

    #[test]
    fn extreme_amounts_saturate_instead_of_overflowing() {
        let items = catalog();
        let mut bank = Bank::new();

        bank.add((ItemId::new(1), ItemAmount::MAX), &items).unwrap();
        bank.add((ItemId::new(1), ItemAmount::MAX), &items).unwrap();
        assert_eq!(bank.amount_of(ItemId::new(1)), ItemAmount::MAX);

        bank.remove((ItemId::new(1), ItemAmount::MIN), &items).unwrap();
        assert_eq!(bank.amount_of(ItemId::new(1)), ItemAmount::MAX);

        bank.remove((ItemId::new(1), ItemAmount::MAX), &items).unwrap();
        assert!(bank.is_empty());
    }

    #[test]
    fn multiply_floors_and_drops_emptied_entries() {
        let items = catalog();
        let mut bank = Bank::new();
        bank.add(("Bones", 5), &items).unwrap();
        bank.add(("Coins", 1), &items).unwrap();

        bank.multiply(0.5);

        assert_eq!(bank.amount_of(ItemId::new(1)), 2);
        assert_eq!(bank.amount_of(ItemId::new(4)), 0);
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn chained_calls_mutate_the_same_ledger() {
        let items = catalog();
        let mut bank = Bank::new();

        bank.add(("Bones", 3), &items)
            .unwrap()
            .add(("Cowhide", 1), &items)
            .unwrap()
            .remove(("Bones", 1), &items)
            .unwrap()
            .multiply(2.0);

        assert_eq!(bank.amount("Bones", &items), 4);
        assert_eq!(bank.amount("Cowhide", &items), 2);
    }

    #[test]
    fn display_sorts_by_descending_quantity_then_id() {
        let items = catalog();
        let mut bank = Bank::new();

        assert_eq!(bank.display(&items), "No items");

        bank.add(("Coins", 100), &items).unwrap();
        bank.add(("Bones", 5), &items).unwrap();
        bank.add(("Cowhide", 5), &items).unwrap();

        assert_eq!(bank.display(&items), "100x Coins, 5x Bones, 5x Cowhide");
    }

    #[test]
    fn display_tolerates_unknown_ids() {
        let items = catalog();
        let mut bank = Bank::new();
        bank.add((ItemId::new(999), 2), &items).unwrap();

        assert_eq!(bank.display(&items), "2x Unknown item");
    }

    #[test]
    fn items_come_back_in_ascending_id_order() {
        let items = catalog();
        let mut bank = Bank::new();
        bank.add(("Coins", 100), &items).unwrap();
        bank.add(("Bones", 5), &items).unwrap();

        let listed = bank.items(&items);

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0.name.as_ref(), "Bones");
        assert_eq!(listed[1].0.name.as_ref(), "Coins");
    }
}
