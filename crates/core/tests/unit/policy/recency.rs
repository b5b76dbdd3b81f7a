//! # Recency List Tests

use cachebench_core::policy::recency::RecencyList;
use pretty_assertions::assert_eq;

fn keys(list: &RecencyList) -> Vec<&str> {
    list.iter().collect()
}

#[test]
fn push_move_and_pop_keep_mru_order() {
    let mut list = RecencyList::with_capacity(4);
    let a = list.push_front("a".to_owned());
    let _b = list.push_front("b".to_owned());
    let _c = list.push_front("c".to_owned());
    assert_eq!(keys(&list), vec!["c", "b", "a"]);

    list.move_to_front(a);
    assert_eq!(keys(&list), vec!["a", "c", "b"]);
    assert_eq!(list.pop_back().as_deref(), Some("b"));
    assert_eq!(list.len(), 2);
}

#[test]
fn removed_slots_are_reused() {
    let mut list = RecencyList::with_capacity(2);
    let a = list.push_front("a".to_owned());
    let _b = list.push_front("b".to_owned());
    assert_eq!(list.remove(a), "a");
    let d = list.push_front("d".to_owned());
    assert_eq!(d, a);
    assert_eq!(list.key(d), "d");
    assert_eq!(keys(&list), vec!["d", "b"]);
}

#[test]
fn draining_leaves_an_empty_list() {
    let mut list = RecencyList::with_capacity(1);
    let _a = list.push_front("a".to_owned());
    assert_eq!(list.pop_back().as_deref(), Some("a"));
    assert!(list.is_empty());
    assert_eq!(list.pop_back(), None);
    assert_eq!(keys(&list), Vec::<&str>::new());
}
