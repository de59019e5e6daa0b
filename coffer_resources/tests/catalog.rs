use std::fs;
use std::path::PathBuf;

use coffer_defs::id::{ItemId, SharedStr};
use coffer_resources::{ItemCatalog, ItemDef, ItemLookup};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("coffer-catalog-{}-{name}", std::process::id()));

    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("items")).unwrap();
    fs::create_dir_all(dir.join("drop_tables")).unwrap();

    dir
}

#[test]
fn loads_a_resource_root_from_disk() {
    let dir = scratch_dir("load");

    fs::write(
        dir.join("items/bones.ron"),
        r#"(id: 1, name: "Bones", value: 1, stackable: true)"#,
    )
    .unwrap();
    // value and stackable left to their defaults
    fs::write(dir.join("items/cowhide.ron"), r#"(id: 2, name: "Cowhide")"#).unwrap();
    fs::write(
        dir.join("drop_tables/cow.ron"),
        r#"(
            name: "cow",
            entries: [
                (item: Name("Bones"), quantity: Fixed(1)),
                (item: Id(2), quantity: Range(1, 3), class: Weighted(8)),
            ],
        )"#,
    )
    .unwrap();

    let mut catalog = ItemCatalog::new();
    catalog.load_all(&dir).unwrap();

    assert_eq!(catalog.resolve_name("Bones").unwrap(), ItemId::new(1));
    assert_eq!(catalog.item_name(ItemId::new(1)), "Bones");

    let cowhide = catalog.item_def(ItemId::new(2)).unwrap();
    assert_eq!(cowhide.value, 0);
    assert!(cowhide.stackable);

    let table = catalog.drop_table("cow").unwrap();
    assert_eq!(table.entries.len(), 2);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn rejects_the_reserved_item_id() {
    let dir = scratch_dir("reserved");

    fs::write(dir.join("items/zero.ron"), r#"(id: 0, name: "Nothing")"#).unwrap();

    let mut catalog = ItemCatalog::new();
    let err = catalog.load_items(&dir).unwrap_err();

    assert!(err.root_cause().to_string().contains("reserved"));
    assert!(catalog.registry.items.is_empty());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn duplicate_names_keep_the_first_id() {
    let mut catalog = ItemCatalog::new();

    for id in [1, 2] {
        catalog.insert_item(ItemDef {
            id: ItemId::new(id),
            name: SharedStr::from("Bones"),
            value: 1,
            stackable: true,
        });
    }

    assert_eq!(catalog.resolve_name("Bones").unwrap(), ItemId::new(1));
    // both descriptors stay reachable by id, only the index is contested
    assert!(catalog.item_def(ItemId::new(2)).is_some());
}
