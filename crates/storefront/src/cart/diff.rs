//! Structural diff of two cart snapshots.

use std::collections::{HashMap, HashSet};

use storegpt_core::{Cart, CartDiff, ProductId, QuantityChange};

/// Compare two cart snapshots, classifying every line item as added,
/// removed, or quantity-changed.
///
/// An id present only in `new` is added; present only in `old` is removed;
/// present in both with differing quantity is changed (carrying both
/// quantities); present in both with equal quantity is omitted entirely.
/// `added` and `changed` follow `new` iteration order, `removed` follows
/// `old` order. Pure and deterministic; inputs are never mutated.
#[must_use]
pub fn diff(old: &Cart, new: &Cart) -> CartDiff {
    let old_by_id: HashMap<ProductId, u32> = old
        .items()
        .iter()
        .map(|line| (line.id, line.quantity))
        .collect();
    let new_ids: HashSet<ProductId> = new.items().iter().map(|line| line.id).collect();

    let mut result = CartDiff::default();

    for line in new.items() {
        match old_by_id.get(&line.id) {
            None => result.added.push(line.clone()),
            Some(&old_quantity) if old_quantity != line.quantity => {
                result.changed.push(QuantityChange {
                    item: line.clone(),
                    old_quantity,
                    new_quantity: line.quantity,
                });
            }
            Some(_) => {}
        }
    }

    for line in old.items() {
        if !new_ids.contains(&line.id) {
            result.removed.push(line.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use storegpt_core::{LineItem, Price};

    fn item(id: i64, quantity: u32) -> LineItem {
        LineItem {
            id: ProductId::new(id),
            name: format!("item-{id}"),
            price: Price::from_cents(100 * id),
            image_src: None,
            quantity,
        }
    }

    fn cart(entries: &[(i64, u32)]) -> Cart {
        Cart::from_items(entries.iter().map(|&(id, q)| item(id, q)).collect())
    }

    #[test]
    fn test_diff_reflexive() {
        let c = cart(&[(1, 2), (3, 1)]);
        assert!(diff(&c, &c).is_empty());
    }

    #[test]
    fn test_diff_classifies_added_removed_changed() {
        let old = cart(&[(1, 1), (2, 2), (3, 3)]);
        let new = cart(&[(2, 5), (3, 3), (4, 1)]);
        let d = diff(&old, &new);

        assert_eq!(
            d.added.iter().map(|l| l.id.as_i64()).collect::<Vec<_>>(),
            vec![4]
        );
        assert_eq!(
            d.removed.iter().map(|l| l.id.as_i64()).collect::<Vec<_>>(),
            vec![1]
        );
        assert_eq!(d.changed.len(), 1);
        let change = d.changed.first().expect("one change");
        assert_eq!(change.item.id, ProductId::new(2));
        assert_eq!((change.old_quantity, change.new_quantity), (2, 5));
    }

    #[test]
    fn test_diff_order_follows_inputs() {
        let old = cart(&[(9, 1), (8, 1)]);
        let new = cart(&[(7, 1), (6, 1)]);
        let d = diff(&old, &new);
        assert_eq!(
            d.added.iter().map(|l| l.id.as_i64()).collect::<Vec<_>>(),
            vec![7, 6]
        );
        assert_eq!(
            d.removed.iter().map(|l| l.id.as_i64()).collect::<Vec<_>>(),
            vec![9, 8]
        );
    }

    #[test]
    fn test_diff_assistant_proposal_scenario() {
        let old = cart(&[(1, 1)]);
        let new = cart(&[(1, 1), (2, 2)]);
        let d = diff(&old, &new);
        assert_eq!(
            d.added.iter().map(|l| (l.id.as_i64(), l.quantity)).collect::<Vec<_>>(),
            vec![(2, 2)]
        );
        assert!(d.removed.is_empty());
        assert!(d.changed.is_empty());
    }

    // Property tests: diff is a structural comparison, so its laws should
    // hold over arbitrary carts (unique ids, positive quantities).

    fn arb_cart() -> impl Strategy<Value = Cart> {
        proptest::collection::btree_map(0i64..20, 1u32..10, 0..8).prop_map(|entries| {
            Cart::from_items(entries.into_iter().map(|(id, q)| item(id, q)).collect())
        })
    }

    proptest! {
        #[test]
        fn prop_diff_reflexivity(c in arb_cart()) {
            prop_assert!(diff(&c, &c).is_empty());
        }

        #[test]
        fn prop_added_removed_duality(a in arb_cart(), b in arb_cart()) {
            let forward: Vec<_> = diff(&a, &b).added.iter().map(|l| l.id).collect();
            let mut backward: Vec<_> = diff(&b, &a).removed.iter().map(|l| l.id).collect();
            let mut forward_sorted = forward;
            forward_sorted.sort_by_key(ProductId::as_i64);
            backward.sort_by_key(ProductId::as_i64);
            prop_assert_eq!(forward_sorted, backward);
        }

        #[test]
        fn prop_changed_quantities_differ(a in arb_cart(), b in arb_cart()) {
            for change in diff(&a, &b).changed {
                prop_assert_ne!(change.old_quantity, change.new_quantity);
            }
        }
    }
}
