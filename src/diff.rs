use crate::models::RosterDelta;
use std::collections::HashSet;

/// Classe chaque client par appartenance ensembliste : présent seulement
/// dans `current` → ajouté, seulement dans `previous` → retiré. Sans état,
/// l'ordre du roster source est conservé dans le delta.
pub fn diff(previous: &[String], current: &[String]) -> RosterDelta {
    let before: HashSet<&str> = previous.iter().map(String::as_str).collect();
    let after: HashSet<&str> = current.iter().map(String::as_str).collect();

    RosterDelta {
        added: current
            .iter()
            .filter(|name| !before.contains(name.as_str()))
            .cloned()
            .collect(),
        removed: previous
            .iter()
            .filter(|name| !after.contains(name.as_str()))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_rosters_give_empty_delta() {
        let r = roster(&["alice", "bob"]);
        let delta = diff(&r, &r);
        assert!(delta.is_empty());
    }

    #[test]
    fn classifies_added_and_removed() {
        let delta = diff(&roster(&["alice", "bob"]), &roster(&["alice", "carol"]));
        assert_eq!(delta.added, vec!["carol"]);
        assert_eq!(delta.removed, vec!["bob"]);
    }

    #[test]
    fn delta_partitions_the_symmetric_difference() {
        let previous = roster(&["a", "b", "c", "d"]);
        let current = roster(&["c", "d", "e", "f"]);
        let delta = diff(&previous, &current);

        // added et removed couvrent la différence symétrique, sans recouvrement
        for name in &delta.added {
            assert!(current.contains(name) && !previous.contains(name));
            assert!(!delta.removed.contains(name));
        }
        for name in &delta.removed {
            assert!(previous.contains(name) && !current.contains(name));
        }
        assert_eq!(delta.added.len() + delta.removed.len(), 4);
    }

    #[test]
    fn empty_current_removes_everything() {
        let delta = diff(&roster(&["alice", "bob"]), &[]);
        assert!(delta.added.is_empty());
        assert_eq!(delta.removed, vec!["alice", "bob"]);
    }
}
