use std::collections::HashSet;

use twodo_board::{Item, ItemId, build_index, descendant_ids, remove_by_ids, root_items};

fn ids(items: &[&Item]) -> Vec<String> {
    items.iter().map(|item| item.id.to_string()).collect()
}

#[test]
fn root_items_of_empty_sequence() {
    assert!(root_items(&[]).is_empty());
}

#[test]
fn orphans_are_roots() {
    let items = vec![
        Item::new("a", "note").parent("gone"),
        Item::new("b", "note").parent("missing"),
    ];
    assert_eq!(ids(&root_items(&items)), vec!["a", "b"]);
}

#[test]
fn roots_keep_sequence_order() {
    let items = vec![
        Item::new("c", "note"),
        Item::new("a", "todo").children(["b"]),
        Item::new("b", "todo").parent("a"),
        Item::new("d", "note"),
    ];
    assert_eq!(ids(&root_items(&items)), vec!["c", "a", "d"]);
}

#[test]
fn delete_set_covers_grandchildren() {
    let items = vec![
        Item::new("p", "note").children(["q", "r"]),
        Item::new("q", "note").parent("p").children(["s"]),
        Item::new("r", "note").parent("p"),
        Item::new("s", "note").parent("q"),
        Item::new("t", "note"),
    ];
    let index = build_index(&items);
    let mut family = descendant_ids(&items[0], &index);
    family.insert(ItemId::from("p"));

    let expected = ["p", "q", "r", "s"]
        .into_iter()
        .map(ItemId::from)
        .collect::<HashSet<_>>();
    assert_eq!(family, expected);

    let survivors = remove_by_ids(&items, &family);
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].id.as_str(), "t");
}

#[test]
fn payload_survives_removal_untouched() {
    let items = vec![
        Item::new("a", "timer").field("seconds", 90),
        Item::new("b", "note").field("text", "hello"),
    ];
    let survivors = remove_by_ids(&items, &HashSet::from([ItemId::from("a")]));
    assert_eq!(survivors, vec![items[1].clone()]);
    assert_eq!(survivors[0].text(), Some("hello"));
}
