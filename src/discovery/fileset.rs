use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};

/// One storage object, as written in a job's file attribute.
pub type FilePath = String;

/// Deduplicated set of active files for one tenant group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFileSet {
    files: HashSet<FilePath>,
}

impl GroupFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the path was already present.
    pub fn insert(&mut self, path: FilePath) -> bool {
        self.files.insert(path)
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.files.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Paths in lexical order.
    pub fn sorted(&self) -> Vec<&FilePath> {
        let mut paths: Vec<&FilePath> = self.files.iter().collect();
        paths.sort();
        paths
    }
}

impl FromIterator<FilePath> for GroupFileSet {
    fn from_iter<I: IntoIterator<Item = FilePath>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for GroupFileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<&str> = self.sorted().into_iter().map(String::as_str).collect();
        write!(f, "fileSet{{{}}}", paths.join(", "))
    }
}

impl Serialize for GroupFileSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.sorted())
    }
}
