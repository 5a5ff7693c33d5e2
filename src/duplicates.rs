use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{File, FingerprintKey};

/// Files within one folder sharing a fingerprint key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub key: FingerprintKey,
    /// Members in the order the store listed them
    pub files: Vec<File>,
}

impl DuplicateGroup {
    pub fn is_duplicate(&self) -> bool {
        self.files.len() > 1
    }
}

/// Partition `files` by fingerprint key.
///
/// Groups come back in order of first appearance and every input file lands
/// in exactly one group.
pub fn group_by_fingerprint(files: &[File]) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut index: HashMap<FingerprintKey, usize> = HashMap::new();

    for file in files {
        let key = file.fingerprint_key();
        match index.get(&key) {
            Some(&position) => groups[position].files.push(file.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(DuplicateGroup {
                    key,
                    files: vec![file.clone()],
                });
            }
        }
    }

    groups
}

/// Groups with at least two members, largest first
pub fn duplicate_groups(files: &[File]) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = group_by_fingerprint(files)
        .into_iter()
        .filter(DuplicateGroup::is_duplicate)
        .collect();
    groups.sort_by(|a, b| b.files.len().cmp(&a.files.len()));
    groups
}

/// Copy-number naming conventions, in tie-break priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixKind {
    /// `name (1).ext`
    Parenthesized,
    /// `name~1.ext`
    Tilde,
    /// `name.1.ext`
    Dotted,
    /// `name_1.ext`
    Underscored,
}

static RE_PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.* \((\d+)\)\.[^.]+$").expect("Invalid parenthesized suffix regex"));
static RE_TILDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+~(\d+)\.[^.]+$").expect("Invalid tilde suffix regex"));
static RE_DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+\.(\d+)\.[^.]+$").expect("Invalid dotted suffix regex"));
static RE_UNDERSCORED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+_(\d+)\.[^.]+$").expect("Invalid underscored suffix regex"));

impl SuffixKind {
    pub const PRIORITY: [SuffixKind; 4] = [
        SuffixKind::Parenthesized,
        SuffixKind::Tilde,
        SuffixKind::Dotted,
        SuffixKind::Underscored,
    ];

    fn regex(self) -> &'static Regex {
        match self {
            SuffixKind::Parenthesized => LazyLock::force(&RE_PARENTHESIZED),
            SuffixKind::Tilde => LazyLock::force(&RE_TILDE),
            SuffixKind::Dotted => LazyLock::force(&RE_DOTTED),
            SuffixKind::Underscored => LazyLock::force(&RE_UNDERSCORED),
        }
    }

    /// Digits of the copy number if `name` follows this convention
    pub fn copy_number(self, name: &str) -> Option<&str> {
        self.regex()
            .captures(name)
            .and_then(|captures| captures.get(1))
            .map(|digits| digits.as_str())
    }

    /// Order two names under this convention alone.
    ///
    /// A name without the suffix sorts first; two suffixed names sort by
    /// copy number. `Equal` means this convention cannot tell them apart.
    fn compare(self, a: &str, b: &str) -> Ordering {
        match (self.copy_number(a), self.copy_number(b)) {
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => compare_digits(x, y),
            (None, None) => Ordering::Equal,
        }
    }
}

/// Compare two ASCII digit strings by numeric value without parsing them
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Order two same-content files by how canonical their names look inside `folder_name`.
pub fn compare_candidates(a: &File, b: &File, folder_name: &str) -> Ordering {
    let a_prefixed = a.name.starts_with(folder_name);
    let b_prefixed = b.name.starts_with(folder_name);

    b_prefixed
        .cmp(&a_prefixed)
        .then_with(|| {
            SuffixKind::PRIORITY
                .iter()
                .map(|kind| kind.compare(&a.name, &b.name))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.name.cmp(&b.name))
}

/// Sort a duplicate group so the file to keep comes first.
pub fn rank(mut files: Vec<File>, folder_name: &str) -> Vec<File> {
    files.sort_by(|a, b| compare_candidates(a, b, folder_name));
    files
}
