use std::path::PathBuf;

/// Joins path segments with exactly one `/` between them.
///
/// One trailing separator is dropped from `base` and from every element, and
/// one leading separator is dropped from every element, so
/// `join("a/", &["/b/", "c"])` yields `a/b/c`.
pub fn join<S: AsRef<str>>(base: &str, elements: &[S]) -> PathBuf {
    let mut joined = base.strip_suffix('/').unwrap_or(base).to_string();
    for element in elements {
        let element = element.as_ref();
        let element = element.strip_suffix('/').unwrap_or(element);
        let element = element.strip_prefix('/').unwrap_or(element);
        joined.push('/');
        joined.push_str(element);
    }
    PathBuf::from(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_collapses_redundant_separators() {
        assert_eq!(join("exp/", &["/tests/", "0.in"]), PathBuf::from("exp/tests/0.in"));
        assert_eq!(join("exp", &["results"]), PathBuf::from("exp/results"));
    }

    #[test]
    fn join_keeps_absolute_base() {
        assert_eq!(join("/code/", &["workdir"]), PathBuf::from("/code/workdir"));
    }

    #[test]
    fn join_without_elements_only_trims_base() {
        let empty: [&str; 0] = [];
        assert_eq!(join("rundir/", &empty), PathBuf::from("rundir"));
    }

    #[test]
    fn join_strips_a_single_separator_only() {
        assert_eq!(join("a//", &["//b"]).to_str(), Some("a///b"));
    }
}
