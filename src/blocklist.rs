//! Ad-serving host blocklist.
//!
//! Loaded once from a hosts-file-style source before the run loop starts
//! and read-only afterwards, so the same instance can be shared freely if
//! record classification is ever parallelized.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use url::Url;

/// Immutable set of ad-serving host names.
///
/// Host names are stored lowercase. `url::Url` lowercases registered
/// domain names while parsing, so candidate matching needs no further
/// normalization.
#[derive(Debug, Default, Clone)]
pub struct Blocklist {
    hosts: HashSet<String>,
}

impl Blocklist {
    /// Empty blocklist; nothing ever matches.
    #[must_use]
    pub fn new() -> Self {
        Blocklist::default()
    }

    /// Load from a hosts-file-style source.
    ///
    /// Lines starting with `#` are comments. Remaining lines are split on
    /// whitespace; the first field (an address) is discarded and every
    /// following field becomes a blocklisted host. Lines with fewer than
    /// two fields are skipped. Duplicate hosts are no-ops.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut hosts = HashSet::new();
        for line in reader.lines() {
            let line = line?;
            if line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            if fields.next().is_none() {
                continue;
            }
            for host in fields {
                hosts.insert(host.to_ascii_lowercase());
            }
        }
        Ok(Blocklist { hosts })
    }

    /// Load from a hosts file on disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Blocklist::from_reader(BufReader::new(File::open(path)?))
    }

    /// Whether `host` is blocklisted.
    #[must_use]
    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(host)
    }

    /// Whether a candidate URL points at a blocklisted host.
    ///
    /// The candidate is parsed as a URL and its host component checked.
    /// Relative or unparseable candidates never match.
    #[must_use]
    pub fn matches_url(&self, candidate: &str) -> bool {
        let Ok(url) = Url::parse(candidate) else {
            return false;
        };
        url.host_str().is_some_and(|host| self.contains(host))
    }

    /// Number of blocklisted hosts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Whether the blocklist is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl FromIterator<String> for Blocklist {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Blocklist {
            hosts: iter
                .into_iter()
                .map(|host| host.to_ascii_lowercase())
                .collect(),
        }
    }
}
