use std::collections::HashMap;

use tracing::warn;

use crate::normalize::{extract_prefix, normalize};
use crate::types::{File, Folder, PrefixStat};

/// A prefix must be left unmatched at least this many times to be reported
pub const MIN_REPORTED_COUNT: usize = 3;

/// Reported prefixes must be longer than this many characters
pub const MIN_REPORTED_LEN: usize = 2;

/// Destination folders keyed by their normalized names
///
/// Built once per run. Folders whose names normalize to the same key shadow
/// each other and the last one supplied wins.
#[derive(Debug, Clone)]
pub struct FolderIndex<'a> {
    folders: &'a [Folder],
    by_key: HashMap<String, &'a Folder>,
}

impl<'a> FolderIndex<'a> {
    pub fn new(folders: &'a [Folder]) -> Self {
        let mut by_key = HashMap::with_capacity(folders.len());
        for folder in folders {
            if let Some(shadowed) = by_key.insert(normalize(&folder.name), folder) {
                warn!(
                    "Folder {} ({}) is shadowed by {} ({}): both normalize to the same key",
                    shadowed.name, shadowed.id, folder.name, folder.id
                );
            }
        }
        Self { folders, by_key }
    }

    /// Folder whose normalized name equals `key`
    pub fn exact(&self, key: &str) -> Option<&'a Folder> {
        self.by_key.get(key).copied()
    }

    /// First folder, in supplied order, whose raw name starts `file_name`
    pub fn leading(&self, file_name: &str) -> Option<&'a Folder> {
        self.folders
            .iter()
            .find(|folder| file_name.starts_with(folder.name.as_str()))
    }
}

/// Maps loose files onto destination folders and tallies the prefixes that miss
#[derive(Debug)]
pub struct PrefixMatcher<'a> {
    index: FolderIndex<'a>,
    unmatched: HashMap<String, usize>,
}

impl<'a> PrefixMatcher<'a> {
    pub fn new(folders: &'a [Folder]) -> Self {
        Self {
            index: FolderIndex::new(folders),
            unmatched: HashMap::new(),
        }
    }

    /// Find the destination for `file` without recording anything
    ///
    /// An exact match on the normalized prefix beats a leading-substring match.
    pub fn find(&self, file: &File) -> Option<&'a Folder> {
        let prefix = normalize(extract_prefix(&file.name));
        self.index
            .exact(&prefix)
            .or_else(|| self.index.leading(&file.name))
    }

    /// Like [`find`](Self::find), but counts the file's prefix when nothing matches
    pub fn resolve(&mut self, file: &File) -> Option<&'a Folder> {
        let found = self.find(file);
        if found.is_none() {
            let prefix = normalize(extract_prefix(&file.name));
            *self.unmatched.entry(prefix).or_insert(0) += 1;
        }
        found
    }

    /// Unmatched count for a normalized prefix
    pub fn unmatched_count(&self, prefix: &str) -> usize {
        self.unmatched.get(prefix).copied().unwrap_or(0)
    }

    /// Recurring, non-trivial unmatched prefixes, most frequent first
    pub fn report(&self) -> Vec<PrefixStat> {
        let mut stats: Vec<PrefixStat> = self
            .unmatched
            .iter()
            .filter(|(prefix, count)| {
                **count >= MIN_REPORTED_COUNT && prefix.chars().count() > MIN_REPORTED_LEN
            })
            .map(|(prefix, count)| PrefixStat {
                normalized_prefix: prefix.clone(),
                unmatched_count: *count,
            })
            .collect();

        stats.sort_by(|a, b| {
            b.unmatched_count
                .cmp(&a.unmatched_count)
                .then_with(|| a.normalized_prefix.cmp(&b.normalized_prefix))
        });
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folders(names: &[&str]) -> Vec<Folder> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Folder::new(format!("F{i}"), *name))
            .collect()
    }

    #[test]
    fn test_exact_match_beats_leading_match() {
        let pool = folders(&["musictrack", "Music"]);
        let matcher = PrefixMatcher::new(&pool);

        let found = matcher.find(&File::new("1", "music_track1.mp3")).unwrap();
        assert_eq!(found.name, "Music");

        let found = matcher.find(&File::new("2", "musictrack-live.mp3")).unwrap();
        assert_eq!(found.name, "musictrack");
    }

    #[test]
    fn test_exact_match_ignores_case_and_punctuation() {
        let pool = folders(&["Tax Returns"]);
        let matcher = PrefixMatcher::new(&pool);
        let found = matcher.find(&File::new("1", "tax-returns_2023.pdf")).unwrap();
        assert_eq!(found.id, "F0");
    }

    #[test]
    fn test_leading_match_is_case_sensitive_and_first_wins() {
        let pool = folders(&["Rec", "Receipts"]);
        let matcher = PrefixMatcher::new(&pool);

        let found = matcher.find(&File::new("1", "Receipts-march.pdf")).unwrap();
        assert_eq!(found.name, "Rec");

        assert!(matcher.find(&File::new("2", "receipts-march.pdf")).is_none());
    }

    #[test]
    fn test_colliding_folder_names_last_wins() {
        let pool = folders(&["Photos", "photos!"]);
        let index = FolderIndex::new(&pool);
        assert_eq!(index.exact("photos").unwrap().id, "F1");
        assert_eq!(index.exact("photos").unwrap().name, "photos!");
    }

    #[test]
    fn test_report_filters_and_orders() {
        let pool = folders(&["Taxes"]);
        let mut matcher = PrefixMatcher::new(&pool);

        let names = [
            "xyz_1.pdf", "xyz_2.pdf", "xyz_3.pdf", "xyz_4.pdf",
            "abcd_1", "abcd_2", "abcd_3",
            "ab_1", "ab_2", "ab_3",
            "rare_1", "rare_2",
            "taxes_2023.pdf",
        ];
        for (i, name) in names.iter().enumerate() {
            matcher.resolve(&File::new(i.to_string(), *name));
        }

        assert_eq!(matcher.unmatched_count("ab"), 3);
        assert_eq!(matcher.unmatched_count("taxes"), 0);

        let report = matcher.report();
        let prefixes: Vec<(&str, usize)> = report
            .iter()
            .map(|s| (s.normalized_prefix.as_str(), s.unmatched_count))
            .collect();
        assert_eq!(prefixes, [("xyz", 4), ("abcd", 3)]);
    }
}
