use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

fn validate_tree<V>(t: &SplayTree<Vec<u8>, V>) {
    let keys: Vec<&Vec<u8>> = t.iter().map(|(_, k, _)| k).collect();
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1], "in-order walk must be strictly increasing");
    }
    assert_eq!(keys.len(), t.len(), "reachable nodes must match len()");
    assert_eq!(t.size(), t.len());
    assert!(t.height() <= t.len());
    assert_eq!(t.is_empty(), t.len() == 0);
}

/// Brute-force abbreviation match: first key extending `prefix`, and whether
/// there is more than one.
fn expected_partial(m: &BTreeMap<Vec<u8>, u32>, prefix: &[u8]) -> (Option<Vec<u8>>, bool) {
    let mut matches = m
        .range(prefix.to_vec()..)
        .map(|(k, _)| k)
        .take_while(|k| k.starts_with(prefix));
    let first = matches.next().cloned();
    let more = matches.next().is_some();
    (first, more)
}

fn check_partial(
    t: &mut SplayTree<Vec<u8>, u32>,
    m: &BTreeMap<Vec<u8>, u32>,
    prefix: &[u8],
) -> std::result::Result<(), TestCaseError> {
    let got = t.partial_lookup(prefix);
    let (first, ambiguous) = expected_partial(m, prefix);
    prop_assert_eq!(got.node.and_then(|id| t.key(id).cloned()), first);
    prop_assert_eq!(got.ambiguous, ambiguous);
    match got.first_ambiguous {
        Some(other) => {
            prop_assert!(ambiguous);
            prop_assert_ne!(Some(other), got.node);
            let other_key = t.key(other).cloned().unwrap_or_default();
            prop_assert!(other_key.starts_with(prefix));
        }
        None => prop_assert!(!ambiguous),
    }
    if got.node.is_some() {
        prop_assert_eq!(t.root(), got.node);
    }
    Ok(())
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    // A tiny alphabet so that keys share prefixes often.
    prop::collection::vec(b'a'..=b'c', 0..=4)
}

fn prefix_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(b'a'..=b'd', 0..=3)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>, u32),
    #[proptest(weight = 2)]
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    Lookup(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    Partial(#[proptest(strategy = "prefix_strategy()")] Vec<u8>),
    #[proptest(weight = 1)]
    SplayTail,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=400)) {
        let mut t: SplayTree<Vec<u8>, u32> = SplayTree::new();
        let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let res = t.insert_entry(key.clone(), value);
                    if m.contains_key(&key) {
                        let is_duplicate = matches!(res, Err(TreeError::DuplicateKey { .. }));
                        prop_assert!(is_duplicate);
                    } else {
                        prop_assert!(res.is_ok());
                        m.insert(key, value);
                    }
                }
                Op::Remove(key) => {
                    let removed = t.remove_key(key.as_slice());
                    let expected = m.remove(&key);
                    prop_assert_eq!(removed.is_some(), expected.is_some());
                    if let Some(id) = removed {
                        prop_assert_eq!(t.free_node(id), Ok(expected));
                    }
                }
                Op::Lookup(key) => {
                    let found = t.lookup(key.as_slice());
                    prop_assert_eq!(found.and_then(|id| t.data(id)).copied(), m.get(&key).copied());
                    if found.is_some() {
                        prop_assert_eq!(t.root(), found);
                    }
                }
                Op::Partial(prefix) => {
                    check_partial(&mut t, &m, &prefix)?;
                }
                Op::SplayTail => {
                    if let Some(tail) = t.tail() {
                        t.splay(tail).unwrap();
                        prop_assert_eq!(t.root(), Some(tail));
                    }
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<(Vec<u8>, u32)> = t
            .iter()
            .map(|(_, k, v)| (k.clone(), v.copied().unwrap_or_default()))
            .collect();
        let expected: Vec<(Vec<u8>, u32)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);

        let flat = t.flatten();
        prop_assert_eq!(flat.len(), m.len() + 1);
        prop_assert_eq!(flat.last().copied(), Some(None));

        let n = m.len();
        let mut deleted = 0;
        prop_assert_eq!(t.zap_with(|_, _| deleted += 1), n);
        prop_assert_eq!(deleted, n);
    }

    /// Random trees reached through random access patterns: the abbreviation
    /// lookup must agree with a full scan whatever shape the tree is in.
    #[test]
    fn prop_partial_lookup_complete(
        keys in prop::collection::btree_set(key_strategy(), 0..=40),
        touches in prop::collection::vec(any::<prop::sample::Index>(), 0..=20),
        prefixes in prop::collection::vec(prefix_strategy(), 1..=20),
    ) {
        let mut t: SplayTree<Vec<u8>, u32> = SplayTree::new();
        let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();
        for (i, key) in keys.iter().enumerate() {
            t.insert_entry(key.clone(), i as u32).unwrap();
            m.insert(key.clone(), i as u32);
        }
        let sorted: Vec<&Vec<u8>> = keys.iter().collect();

        for (round, prefix) in prefixes.iter().enumerate() {
            if !sorted.is_empty() {
                if let Some(touch) = touches.get(round) {
                    t.lookup(touch.get(&sorted).as_slice());
                }
            }
            check_partial(&mut t, &m, prefix)?;
        }
        validate_tree(&t);
    }

    /// Sorted insertion is the worst case for an unbalanced tree; with the
    /// forced splay and some random traffic the height stays logarithmic.
    #[test]
    fn prop_sorted_insert_height(seed in any::<u64>()) {
        const N: u32 = 1024;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t: SplayTree<u32, (), _> =
            SplayTree::with_comparator(|a: &u32, b: &u32| a.cmp(b));
        for i in 0..N {
            t.insert_entry(i, ()).unwrap();
        }
        prop_assert!(t.height() <= (N / 3) as usize);

        for _ in 0..4 * N {
            let key = rng.gen_range(0..N);
            prop_assert!(t.lookup(&key).is_some());
        }
        let bound = 4 * (N as f64).log2() as usize;
        prop_assert!(t.height() <= bound, "height {} > {}", t.height(), bound);
        prop_assert_eq!(t.size(), N as usize);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_keys() -> Vec<Vec<u8>> {
    vec![
        b"a".to_vec(),
        b"ab".to_vec(),
        b"abc".to_vec(),
        b"b".to_vec(),
        b"ba".to_vec(),
        b"c".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_keys();
    let prefixes: [&[u8]; 9] = [b"", b"a", b"ab", b"abc", b"abd", b"b", b"ba", b"c", b"d"];

    for_each_permutation(&keys, |perm| {
        let mut t: SplayTree<Vec<u8>, u32> = SplayTree::new();
        let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();
        for (i, k) in perm.into_iter().enumerate() {
            t.insert_entry(k.clone(), i as u32).unwrap();
            m.insert(k, i as u32);
        }
        validate_tree(&t);

        for prefix in prefixes {
            check_partial(&mut t, &m, prefix).unwrap();
            validate_tree(&t);
        }
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_keys();

    let mut base: SplayTree<Vec<u8>, u32> = SplayTree::new();
    for (i, k) in keys.iter().enumerate() {
        base.insert_entry(k.clone(), i as u32).unwrap();
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut remaining = keys.len();
        for k in perm {
            let id = t.remove_key(k.as_slice()).expect("key present");
            assert!(t.free_node(id).unwrap().is_some());
            remaining -= 1;
            assert_eq!(t.len(), remaining);
            validate_tree(&t);
        }
        assert!(t.is_empty());
        assert_eq!(t.root(), None);
    });
}

#[test]
fn randomized_splay_keeps_order() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut t: SplayTree<Vec<u8>, u32> = SplayTree::new();
    let mut ids = Vec::new();
    for i in 0..500u32 {
        let key = format!("sym{:04}", rng.gen_range(0..10_000)).into_bytes();
        if let Ok(id) = t.insert_entry(key, i) {
            ids.push(id);
        }
    }
    for _ in 0..2000 {
        let id = ids[rng.gen_range(0..ids.len())];
        t.splay(id).unwrap();
        assert_eq!(t.root(), Some(id));
    }
    validate_tree(&t);
}
