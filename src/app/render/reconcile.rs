use std::collections::{HashMap, HashSet};
use std::hash::Hash;

pub(crate) trait Keyed {
    type Key: Clone + Eq + Hash;

    fn key(&self) -> &Self::Key;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Delta<K> {
    pub(crate) entered: Vec<K>,
    pub(crate) exited: Vec<K>,
    pub(crate) kept: usize,
}

impl<K> Default for Delta<K> {
    fn default() -> Self {
        Self {
            entered: Vec::new(),
            exited: Vec::new(),
            kept: 0,
        }
    }
}

/// Synchronizes `bound` with `incoming` by key.
///
/// Elements whose key disappeared are dropped, new keys get an element from
/// `enter`, and surviving elements are handed to `update` without being
/// recreated. The result follows the order of `incoming`; repeated keys in
/// `incoming` bind only their first occurrence.
pub(crate) fn reconcile<D, E: Keyed>(
    bound: &mut Vec<E>,
    incoming: &[D],
    data_key: impl Fn(&D) -> E::Key,
    mut enter: impl FnMut(&D) -> E,
    mut update: impl FnMut(&mut E, &D),
) -> Delta<E::Key> {
    let mut previous = bound
        .drain(..)
        .map(|element| (element.key().clone(), element))
        .collect::<HashMap<_, _>>();

    let mut delta = Delta::default();
    let mut seen = HashSet::with_capacity(incoming.len());
    let mut merged = Vec::with_capacity(incoming.len());

    for datum in incoming {
        let key = data_key(datum);
        if !seen.insert(key.clone()) {
            continue;
        }

        match previous.remove(&key) {
            Some(mut element) => {
                update(&mut element, datum);
                delta.kept += 1;
                merged.push(element);
            }
            None => {
                merged.push(enter(datum));
                delta.entered.push(key);
            }
        }
    }

    delta.exited = previous.into_keys().collect();
    *bound = merged;
    delta
}
