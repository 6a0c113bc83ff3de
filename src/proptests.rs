use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

/// Returns `(height, node_count)` of the subtree after checking it.
fn validate_node<K: Ord>(link: &Link<K>, lower: Option<&K>, upper: Option<&K>) -> (u8, usize) {
    let Some(node) = link.as_deref() else {
        return (0, 0);
    };

    if let Some(lower) = lower {
        assert!(lower < &node.value, "key must exceed everything on its left");
    }
    if let Some(upper) = upper {
        assert!(&node.value < upper, "key must precede everything on its right");
    }

    let (left_h, left_n) = validate_node(&node.left, lower, Some(&node.value));
    let (right_h, right_n) = validate_node(&node.right, Some(&node.value), upper);

    assert!(
        left_h.abs_diff(right_h) <= 1,
        "subtree heights differ by more than one ({left_h} vs {right_h})"
    );
    assert_eq!(
        node.height,
        1 + left_h.max(right_h),
        "stored node height must match children"
    );

    (node.height, left_n + right_n + 1)
}

pub(crate) fn validate_tree<K: Ord>(t: &AvlTree<K>) {
    let (h, count) = validate_node(&t.root, None, None);
    assert_eq!(count, t.len, "reachable node count must match AvlTree::len");
    assert_eq!(usize::from(h), t.height());

    let bound = 1.44 * (t.len as f64 + 2.0).log2();
    assert!(
        f64::from(h) <= bound,
        "height {h} exceeds AVL bound {bound:.2} for {} keys",
        t.len
    );
}

#[derive(Arbitrary, Clone, Debug)]
enum Op {
    #[proptest(weight = 5)]
    Insert(#[proptest(strategy = "0i32..128")] i32),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "0i32..128")] i32),
    #[proptest(weight = 2)]
    Contains(#[proptest(strategy = "0i32..128")] i32),
}

fn distinct_keys() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::btree_set(any::<i32>(), 0..=300).prop_map(|s| s.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_btreeset(ops in prop::collection::vec(any::<Op>(), 0..=2000)) {
        let mut t: AvlTree<i32> = AvlTree::new();
        let mut s: BTreeSet<i32> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => prop_assert_eq!(t.insert(key), s.insert(key)),
                Op::Remove(key) => prop_assert_eq!(t.remove(&key), s.remove(&key)),
                Op::Contains(key) => prop_assert_eq!(t.contains(&key), s.contains(&key)),
            }
            prop_assert_eq!(t.len(), s.len());
        }

        validate_tree(&t);
        let got: Vec<i32> = t.inorder().copied().collect();
        let expected: Vec<i32> = s.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_size_conservation(keys in distinct_keys(), removed in 0usize..=300) {
        let mut t = AvlTree::new();
        for &k in &keys {
            prop_assert!(t.insert(k));
        }
        prop_assert_eq!(t.inorder().count(), keys.len());

        let k = removed.min(keys.len());
        for key in &keys[..k] {
            prop_assert!(t.remove(key));
        }
        validate_tree(&t);
        prop_assert_eq!(t.inorder().count(), keys.len() - k);
        prop_assert!(t.inorder().copied().eq(keys[k..].iter().copied()));
    }

    #[test]
    fn prop_duplicate_insert_keeps_shape(keys in distinct_keys(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!keys.is_empty());
        let mut t = AvlTree::new();
        for &k in &keys {
            t.insert(k);
        }
        let heights_before = t.height();
        let before = t.clone();

        prop_assert!(!t.insert(keys[pick.index(keys.len())]));
        prop_assert_eq!(t.height(), heights_before);
        prop_assert_eq!(&t, &before);
        validate_tree(&t);
    }

    #[test]
    fn prop_insert_then_remove_round_trips(keys in distinct_keys(), extra in any::<i32>()) {
        prop_assume!(!keys.contains(&extra));
        let mut t = AvlTree::new();
        for &k in &keys {
            t.insert(k);
        }
        let before: Vec<i32> = t.inorder().copied().collect();

        prop_assert!(t.insert(extra));
        validate_tree(&t);
        prop_assert!(t.remove(&extra));
        validate_tree(&t);

        let after: Vec<i32> = t.inorder().copied().collect();
        prop_assert_eq!(after, before);
        prop_assert!(!t.remove(&extra));
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

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<i32> = (1..=7).collect();

    for_each_permutation(&keys, |perm| {
        let mut t = AvlTree::new();
        for k in perm {
            assert!(t.insert(k));
            validate_tree(&t);
        }
        assert!(t.height() <= 4);
        assert!(t.inorder().copied().eq(keys.iter().copied()));
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<i32> = (1..=7).collect();

    // Insert in a fixed order, then remove in all permutations.
    let mut base = AvlTree::new();
    for &k in &keys {
        base.insert(k);
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut s: BTreeSet<i32> = keys.iter().copied().collect();

        for k in perm {
            assert_eq!(t.take(&k), s.take(&k));
            assert_eq!(t.len(), s.len());
            validate_tree(&t);
        }
        assert_eq!(t.len(), 0);
        assert!(t.root.is_none());
    });
}
