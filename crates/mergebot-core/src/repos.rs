//! Monitored repository set.

/// The set of repository names the bot acts on.
///
/// Built once at startup from a delimited configuration list; sorted and
/// deduplicated so membership is a binary search. Immutable afterwards, so
/// it can be shared across event tasks without synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredRepos(Vec<String>);

impl MonitoredRepos {
    /// Build the set from raw names, sorting and dropping duplicates and
    /// empty entries.
    #[must_use]
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let mut names: Vec<String> = names.into_iter().filter(|n| !n.is_empty()).collect();
        names.sort();
        names.dedup();
        Self(names)
    }

    /// Parse a delimited list, e.g. the comma-separated `REPOS` variable.
    #[must_use]
    pub fn parse(list: &str, sep: char) -> Self {
        Self::new(list.split(sep).map(str::to_string))
    }

    /// Exact, case-sensitive membership check.
    #[must_use]
    pub fn contains(&self, repo: &str) -> bool {
        self.0.binary_search_by(|r| r.as_str().cmp(repo)).is_ok()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The monitored names, sorted.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }
}
