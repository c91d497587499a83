/// The journal mode of the underlying SQLite database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    Delete,
    Truncate,
    /// Write-ahead logging. Readers proceed concurrently with a single writer.
    Wal,
    Memory,
}

impl JournalMode {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Wal => "WAL",
            JournalMode::Memory => "MEMORY",
        }
    }
}

/// Options for opening a [QuadStore](crate::QuadStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Size of the page cache in KiB.
    pub cache_size_kib: u32,
    /// Maximum number of bytes that are memory mapped.
    pub mmap_size: u64,
    /// Keeps the database locked for the lifetime of the connection.
    pub exclusive: bool,
    /// Defaults to [JournalMode::Wal] for files and [JournalMode::Memory] for in-memory stores.
    pub journal_mode: Option<JournalMode>,
    /// Number of inserted triples after which the planner statistics are refreshed. `0` disables
    /// the automatic refresh.
    pub analyze_threshold: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            cache_size_kib: 200_000,
            mmap_size: 256 * 1024 * 1024,
            exclusive: false,
            journal_mode: None,
            analyze_threshold: 1000,
        }
    }
}

impl StoreOptions {
    #[must_use]
    pub fn with_cache_size_kib(mut self, cache_size_kib: u32) -> Self {
        self.cache_size_kib = cache_size_kib;
        self
    }

    #[must_use]
    pub fn with_mmap_size(mut self, mmap_size: u64) -> Self {
        self.mmap_size = mmap_size;
        self
    }

    #[must_use]
    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    #[must_use]
    pub fn with_journal_mode(mut self, journal_mode: JournalMode) -> Self {
        self.journal_mode = Some(journal_mode);
        self
    }

    #[must_use]
    pub fn with_analyze_threshold(mut self, analyze_threshold: u64) -> Self {
        self.analyze_threshold = analyze_threshold;
        self
    }
}
