//! Function names for the steps of one suite.

use std::collections::{HashMap, HashSet};

/// Make generated names unique within a suite.
///
/// The first occurrence of a name keeps it; later ones get the lowest
/// numeric suffix, starting at 2, that is not already taken.
pub(crate) fn disambiguate<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<&'a str, usize> = HashMap::new();
    let mut unique = Vec::new();

    for name in names {
        if used.insert(name.to_string()) {
            unique.push(name.to_string());
            continue;
        }
        let suffix = next_suffix.entry(name).or_insert(2);
        loop {
            let candidate = format!("{name}{suffix}");
            *suffix += 1;
            if used.insert(candidate.clone()) {
                unique.push(candidate);
                break;
            }
        }
    }
    unique
}
