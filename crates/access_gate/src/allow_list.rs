//! Ordered origin allow-list

use contracts::AccessConfig;

/// Configured origins, in configuration order
///
/// Read-only after construction. Lookup is a linear exact comparison;
/// lists are a handful of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    entries: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Byte-exact membership
    pub fn contains(&self, origin: &str) -> bool {
        self.entries.iter().any(|entry| entry == origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries shaped like `a.b.c.d/n`
    ///
    /// These never match an address inside the range, only a request whose
    /// Origin header is the literal string.
    pub fn range_like_entries(&self) -> Vec<&str> {
        self.iter().filter(|entry| looks_like_cidr(entry)).collect()
    }
}

impl From<&AccessConfig> for AllowList {
    fn from(config: &AccessConfig) -> Self {
        Self::new(config.allowed_origins.iter().cloned())
    }
}

fn looks_like_cidr(entry: &str) -> bool {
    let Some((addr, prefix)) = entry.split_once('/') else {
        return false;
    };
    let octets_ok = {
        let parts: Vec<&str> = addr.split('.').collect();
        parts.len() == 4 && parts.iter().all(|p| p.parse::<u8>().is_ok())
    };
    octets_ok && prefix.parse::<u8>().is_ok_and(|p| p <= 32)
}
