//! Persisted word-frequency table backing the adaptive detection model.
//!
//! Every call opens its own connection, performs one unit of work and closes
//! it again. Reads take no lock; writes are serialized through `write_lock`.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::{
    domain::{DetectionResult, WordWeight},
    Result,
};

/// Schema scripts compiled into the crate, applied in order.
const SCHEMA: &[(&str, &str)] = &[(
    "001_languages.sql",
    include_str!("../resources/schema/001_languages.sql"),
)];

const INSERT_IGNORE: &str =
    "INSERT OR IGNORE INTO `languages` (`language_id`, `word`, `weight`) VALUES (?1, ?2, ?3)";

const BUSY_TIMEOUT: Duration = Duration::from_secs(60);

/// Counts gathered while seeding the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub scripts: usize,
    pub files: usize,
    pub rows_inserted: usize,
    pub rows_skipped: usize,
}

pub struct FrequencyStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FrequencyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Apply the bundled schema, then any `*.sql` scripts and `<language_id>.csv`
    /// seed files found in `seed_dir`. Safe to run on every start: seeds are
    /// merged with insert-or-ignore.
    pub fn initialize(&self, seed_dir: Option<&Path>) -> Result<SeedReport> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut report = SeedReport::default();

        let conn = self.connect()?;
        for (name, script) in SCHEMA {
            debug!("applying bundled schema {name}");
            conn.execute_batch(script)?;
            report.scripts += 1;
        }

        let Some(dir) = seed_dir else {
            return Ok(report);
        };
        if !dir.is_dir() {
            warn!("seed directory {} does not exist", dir.display());
            return Ok(report);
        }

        for script in list_files(dir, "sql")? {
            info!("executing {}", script.display());
            conn.execute_batch(&fs::read_to_string(&script)?)?;
            report.scripts += 1;
        }
        drop(conn);

        for file in list_files(dir, "csv")? {
            let (inserted, skipped) = self.import_seed_file_locked(&file)?;
            report.files += 1;
            report.rows_inserted += inserted;
            report.rows_skipped += skipped;
        }

        info!(
            "frequency store ready: {} scripts, {} seed files, {} new rows",
            report.scripts, report.files, report.rows_inserted
        );
        Ok(report)
    }

    /// Import one seed file. The language id is the lower-cased file stem.
    /// Returns `(inserted, skipped)` row counts.
    fn import_seed_file_locked(&self, file: &Path) -> Result<(usize, usize)> {
        let language_id = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if language_id.is_empty() {
            return Ok((0, 0));
        }

        let raw = fs::read_to_string(file)?;
        let mut rows = Vec::new();
        let mut skipped = 0;
        for (lineno, line) in raw.lines().enumerate() {
            match parse_seed_row(&language_id, line) {
                SeedRow::Row(row) => rows.push(row),
                SeedRow::Blank => {}
                SeedRow::Invalid => {
                    skipped += 1;
                    warn!("{}:{}: invalid seed row", file.display(), lineno + 1);
                }
            }
        }

        let inserted = self.insert_rows_locked(&rows)?;
        debug!("seeded {language_id} from {}: {inserted} new rows", file.display());
        Ok((inserted, skipped))
    }

    /// Per-language (distinct match count, summed weight) for the given tokens,
    /// ordered by summed weight descending.
    pub fn query(&self, words: &[String]) -> Result<Vec<DetectionResult>> {
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; words.len()].join(", ");
        let sql = format!(
            "SELECT `language_id`, COUNT(*), SUM(`weight`) AS `total` FROM `languages` \
             WHERE `word` IN ({placeholders}) \
             GROUP BY `language_id` \
             ORDER BY `total` DESC, `language_id` ASC"
        );

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(words.iter()), |row| {
            Ok(DetectionResult {
                language_id: row.get(0)?,
                matched_word_count: row.get(1)?,
                summed_weight: row.get::<_, i64>(2)?.max(0) as u64,
                sample_size: words.len(),
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Insert `weight = 1` rows for words the language does not know yet.
    /// Existing rows are never touched. Returns the number of new rows.
    pub fn insert_missing(&self, language_id: &str, words: &[String]) -> Result<usize> {
        if words.is_empty() {
            return Ok(0);
        }

        let rows: Vec<WordWeight> = words
            .iter()
            .map(|word| WordWeight {
                language_id: language_id.to_string(),
                word: word.clone(),
                weight: 1,
            })
            .collect();
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.insert_rows_locked(&rows)
    }

    /// Insert-or-ignore in one transaction. Caller holds `write_lock`.
    fn insert_rows_locked(&self, rows: &[WordWeight]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(INSERT_IGNORE)?;
            for row in rows {
                inserted += stmt.execute(params![row.language_id, row.word, row.weight])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Every row of one language, heaviest first.
    pub fn words_of(&self, language_id: &str) -> Result<Vec<WordWeight>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT `word`, `weight` FROM `languages` WHERE `language_id` = ?1 \
             ORDER BY `weight` DESC, `word` ASC",
        )?;
        let rows = stmt.query_map(params![language_id], |row| {
            Ok(WordWeight {
                language_id: language_id.to_string(),
                word: row.get(0)?,
                weight: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn weight_of(&self, language_id: &str, word: &str) -> Result<Option<u32>> {
        let conn = self.connect()?;
        let weight = conn
            .query_row(
                "SELECT `weight` FROM `languages` WHERE `language_id` = ?1 AND `word` = ?2",
                params![language_id, word],
                |row| row.get::<_, u32>(0),
            )
            .optional()?;
        Ok(weight)
    }

    pub fn count_words(&self, language_id: &str) -> Result<usize> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM `languages` WHERE `language_id` = ?1",
            params![language_id],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as usize)
    }
}

enum SeedRow {
    Row(WordWeight),
    Blank,
    Invalid,
}

/// `word,weight`; the weight is split off the last comma.
fn parse_seed_row(language_id: &str, line: &str) -> SeedRow {
    let line = line.trim();
    if line.is_empty() {
        return SeedRow::Blank;
    }
    let Some((word, weight)) = line.rsplit_once(',') else {
        return SeedRow::Invalid;
    };
    let word = word.trim().trim_matches('"').to_lowercase();
    match weight.trim().parse::<u32>() {
        Ok(weight) if weight >= 1 && !word.is_empty() => SeedRow::Row(WordWeight {
            language_id: language_id.to_string(),
            word,
            weight,
        }),
        _ => SeedRow::Invalid,
    }
}

fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
