//! Minimal add/remove deltas between a current and a desired relationship set

use std::collections::HashSet;
use std::hash::Hash;

use crate::models::Policy;

/// Compute `(target - source, source - target)`.
///
/// Duplicates collapse; each side keeps the order of first appearance.
pub fn diff<T>(source: &[T], target: &[T]) -> (Vec<T>, Vec<T>)
where
    T: Clone + Eq + Hash,
{
    diff_by(source, target, |item| item.clone())
}

/// [`diff`] keyed on the full (role, object, domain, action) tuple
pub fn diff_policy(source: &[Policy], target: &[Policy]) -> (Vec<Policy>, Vec<Policy>) {
    diff_by(source, target, Policy::key)
}

fn diff_by<T, K, F>(source: &[T], target: &[T], key: F) -> (Vec<T>, Vec<T>)
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let source_keys: HashSet<K> = source.iter().map(&key).collect();
    let target_keys: HashSet<K> = target.iter().map(&key).collect();

    let mut seen = HashSet::new();
    let add = target
        .iter()
        .filter(|item| {
            let k = key(*item);
            !source_keys.contains(&k) && seen.insert(k)
        })
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let remove = source
        .iter()
        .filter(|item| {
            let k = key(*item);
            !target_keys.contains(&k) && seen.insert(k)
        })
        .cloned()
        .collect();

    (add, remove)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Domain, Object, Role};

    fn policy(role: u64, object: u64, action: Action) -> Policy {
        Policy::new(
            Role {
                id: role,
                ..Role::default()
            },
            Object {
                id: object,
                ..Object::default()
            },
            Domain {
                id: 1,
                ..Domain::default()
            },
            action,
        )
    }

    #[test]
    fn test_diff_of_identical_sets_is_empty() {
        let set = vec![1u64, 2, 3];
        let (add, remove) = diff(&set, &set);
        assert!(add.is_empty());
        assert!(remove.is_empty());
    }

    #[test]
    fn test_diff_is_minimal_and_disjoint() {
        let source = vec![1u64, 2, 3];
        let target = vec![2u64, 3, 4, 5];
        let (add, remove) = diff(&source, &target);
        assert_eq!(add, vec![4, 5]);
        assert_eq!(remove, vec![1]);
        assert!(add.iter().all(|x| !remove.contains(x)));
    }

    #[test]
    fn test_diff_swaps_outputs_when_arguments_swap() {
        let a = vec![1u64, 2];
        let b = vec![2u64, 3];
        let (add_ab, remove_ab) = diff(&a, &b);
        let (add_ba, remove_ba) = diff(&b, &a);
        assert_eq!(add_ab, remove_ba);
        assert_eq!(remove_ab, add_ba);
    }

    #[test]
    fn test_diff_collapses_duplicates() {
        let (add, remove) = diff(&[7u64, 7], &[8u64, 8, 8]);
        assert_eq!(add, vec![8]);
        assert_eq!(remove, vec![7]);
    }

    #[test]
    fn test_diff_policy_keys_on_full_tuple() {
        let source = vec![policy(1, 2, Action::Read), policy(1, 3, Action::Read)];
        let target = vec![
            policy(1, 2, Action::Read),
            policy(1, 2, Action::Write),
            policy(1, 4, Action::Read),
        ];

        let (add, remove) = diff_policy(&source, &target);
        let added: Vec<_> = add.iter().map(Policy::key).collect();
        let removed: Vec<_> = remove.iter().map(Policy::key).collect();
        assert_eq!(added, vec![(1, 2, 1, Action::Write), (1, 4, 1, Action::Read)]);
        assert_eq!(removed, vec![(1, 3, 1, Action::Read)]);

        let (add, remove) = diff_policy(&target, &target);
        assert!(add.is_empty() && remove.is_empty());
    }
}
