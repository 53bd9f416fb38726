//! Mutual exclusion between options.

use std::sync::Arc;

use crate::option::{Opt, OptionTable};

/// True if `l` and `r` may not both be given.
///
/// Symmetric: either side's exclusion spec may name the other, and two
/// options that each switch to a different positional table exclude each
/// other implicitly.
pub fn excludes2(l: &Opt, r: &Opt) -> bool {
    if let Some(x) = l.exclusions() {
        if x.excludes(r.optopt()) {
            return true;
        }
    }
    if let Some(x) = r.exclusions() {
        if x.excludes(l.optopt()) {
            return true;
        }
    }
    match (l.params(), r.params()) {
        (Some(lp), Some(rp)) => !Arc::ptr_eq(lp, rp),
        _ => false,
    }
}

/// The first option (in table order) given at least `min_given` times that
/// is mutually exclusive with `candidate`.
///
/// `given` holds the occurrence count of each option, index-aligned with
/// `options`.
pub fn find_excluding<'a>(
    options: &'a [Opt],
    given: &[usize],
    candidate: &Opt,
    min_given: usize,
) -> Option<&'a Opt> {
    options
        .iter()
        .zip(given.iter())
        .find(|&(o, &n)| n >= min_given && excludes2(candidate, o))
        .map(|(o, _)| o)
}

/// Maximal groups of pairwise mutually exclusive options among `members`,
/// for usage display.
///
/// Each member contributes the group of members it excludes (itself
/// included, in `members` order).  Duplicate groups are dropped, as are
/// groups holding a pair that does not exclude each other, which the
/// `^set` spelling can otherwise produce.
pub fn exclusion_groups(table: &OptionTable, members: &[char]) -> Vec<Vec<char>> {
    let lookup: Vec<&Opt> = members.iter().filter_map(|&c| table.find(c)).collect();
    let mut groups: Vec<Vec<char>> = Vec::new();

    for cur in &lookup {
        let group: Vec<char> = lookup
            .iter()
            .filter(|o| o.optopt() == cur.optopt() || excludes2(cur, o))
            .map(|o| o.optopt())
            .collect();

        if !groups.contains(&group) {
            groups.push(group);
        }
    }

    groups.retain(|group| {
        let opts: Vec<&Opt> = group.iter().filter_map(|&c| table.find(c)).collect();
        opts.iter().enumerate().all(|(i, l)| {
            opts.iter()
                .enumerate()
                .all(|(j, r)| i == j || excludes2(l, r))
        })
    });

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Param, ParamTable};

    fn xyz() -> OptionTable {
        OptionTable::new()
            .option(Opt::new('x').excludes("yz"))
            .option(Opt::new('y').excludes("xz"))
            .option(Opt::new('z').excludes("xy"))
            .option(Opt::new('q'))
    }

    #[test]
    fn exclusion_is_symmetric() {
        let a = Opt::new('a').excludes("b");
        let b = Opt::new('b');
        let c = Opt::new('c');
        assert!(excludes2(&a, &b));
        assert!(excludes2(&b, &a));
        assert!(!excludes2(&a, &c));
        assert!(!excludes2(&c, &b));
    }

    #[test]
    fn star_and_complement() {
        let v = Opt::new('V').excludes("*");
        let h = Opt::new('h').excludes("^v");
        let verbose = Opt::new('v');
        let other = Opt::new('i');
        assert!(excludes2(&v, &other));
        assert!(excludes2(&v, &v));
        assert!(!excludes2(&h, &verbose));
        assert!(excludes2(&h, &other));
    }

    #[test]
    fn distinct_param_tables_exclude() {
        let pa = Arc::new(ParamTable::new().param(Param::new("[files...]")));
        let pb = Arc::new(ParamTable::new().param(Param::new("file")));
        let a = Opt::new('a').paramv(pa.clone());
        let b = Opt::new('b').paramv(pb);
        let a2 = Opt::new('A').paramv(pa);
        assert!(excludes2(&a, &b));
        assert!(!excludes2(&a, &a2));
        assert!(!excludes2(&a, &Opt::new('z')));

        let h = Opt::new('h').paramv(ParamTable::none());
        let v = Opt::new('V').paramv(ParamTable::none());
        assert!(!excludes2(&h, &v));
    }

    #[test]
    fn find_excluding_respects_given_counts() {
        let t = xyz();
        let z = t.find('z').unwrap();
        assert!(find_excluding(t.as_slice(), &[0, 0, 0, 0], z, 1).is_none());
        let hit = find_excluding(t.as_slice(), &[0, 1, 0, 0], z, 1).unwrap();
        assert_eq!(hit.optopt(), 'y');
        let q = t.find('q').unwrap();
        assert!(find_excluding(t.as_slice(), &[1, 1, 1, 1], q, 1).is_none());
    }

    #[test]
    fn groups_for_clique() {
        let t = xyz();
        assert_eq!(exclusion_groups(&t, &['x', 'y', 'z']), vec![vec!['x', 'y', 'z']]);
    }

    #[test]
    fn non_transitive_groups_are_dropped() {
        // x-y and y-z exclude, x-z do not.
        let t = OptionTable::new()
            .option(Opt::new('x').excludes("y"))
            .option(Opt::new('y').excludes("xz"))
            .option(Opt::new('z').excludes("y"));
        let groups = exclusion_groups(&t, &['x', 'y', 'z']);
        assert_eq!(groups, vec![vec!['x', 'y'], vec!['y', 'z']]);
    }

    #[test]
    fn self_only_group() {
        let t = OptionTable::new().option(Opt::new('L').excludes(""));
        assert_eq!(exclusion_groups(&t, &['L']), vec![vec!['L']]);
    }
}
