//! Plain-text workload files.
//!
//! - `memconfig`: a single non-negative integer, the main memory capacity.
//! - `processes`: `<cores> <count>` followed by `count` pairs of
//!   `<start> <duration>`, whitespace separated across any number of lines.
//! - `commands`: one command per line, handed out round-robin so that line
//!   `i` belongs to process `i % count`.
//!
//! Command lines are kept verbatim here; parsing them is the runner's job so
//! that a bad line only affects its own process.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{ConfigError, MemtierConfig};

/// One row of the process table, in table units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessEntry {
    pub start: u64,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTable {
    /// Core count from the header. Recorded but not used for scheduling:
    /// every process gets its own thread.
    pub cores: u32,
    pub entries: Vec<ProcessEntry>,
}

/// A process ready to run, with times already in clock units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub id: u32,
    pub start: u64,
    pub duration: u64,
    pub commands: Vec<String>,
}

/// Everything the simulation needs from the input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub capacity: usize,
    pub processes: Vec<ProcessSpec>,
}

impl Workload {
    /// Reads the files named in `config.io`. A capacity set in the
    /// configuration wins over the `memconfig` file, which is then not read.
    pub fn load(config: &MemtierConfig) -> Result<Self, ConfigError> {
        let capacity = match config.memory.capacity {
            Some(capacity) => capacity,
            None => read_capacity(&config.io.memconfig)?,
        };
        let table = read_process_table(&config.io.processes)?;
        let commands = read_commands(&config.io.commands)?;

        let workload = Self::assemble(capacity, &table, commands, config.runner.time_scale);
        debug!(
            capacity = workload.capacity,
            processes = workload.processes.len(),
            "Workload loaded"
        );
        Ok(workload)
    }

    /// Combines parsed inputs, numbering processes from 1 and scaling table
    /// times by `time_scale`.
    pub fn assemble(
        capacity: usize,
        table: &ProcessTable,
        commands: Vec<String>,
        time_scale: u64,
    ) -> Self {
        let lists = distribute_round_robin(commands, table.entries.len());
        let processes = table
            .entries
            .iter()
            .zip(lists)
            .zip(1u32..)
            .map(|((entry, commands), id)| ProcessSpec {
                id,
                start: entry.start.saturating_mul(time_scale),
                duration: entry.duration.saturating_mul(time_scale),
                commands,
            })
            .collect();

        Self {
            capacity,
            processes,
        }
    }
}

pub fn read_capacity(path: &Path) -> Result<usize, ConfigError> {
    parse_capacity(&read(path)?, path)
}

pub fn read_process_table(path: &Path) -> Result<ProcessTable, ConfigError> {
    parse_process_table(&read(path)?, path)
}

pub fn read_commands(path: &Path) -> Result<Vec<String>, ConfigError> {
    Ok(parse_commands(&read(path)?))
}

/// Parses the capacity file. Only the first token is significant.
pub fn parse_capacity(text: &str, path: &Path) -> Result<usize, ConfigError> {
    let mut tokens = Tokens::new(text, path);
    let (line, token) = tokens
        .next()
        .ok_or_else(|| malformed(path, 1, "missing memory capacity"))?;

    match token.parse::<i64>() {
        Ok(value) if value < 0 => Err(malformed(
            path,
            line,
            format!("memory capacity must be non-negative, got {value}"),
        )),
        Ok(value) => usize::try_from(value)
            .map_err(|_| malformed(path, line, format!("memory capacity {value} is too large"))),
        Err(_) => Err(malformed(
            path,
            line,
            format!("memory capacity must be an integer, got {token:?}"),
        )),
    }
}

pub fn parse_process_table(text: &str, path: &Path) -> Result<ProcessTable, ConfigError> {
    let mut tokens = Tokens::new(text, path);

    let cores = tokens.number("core count")?;
    let count = tokens.number("process count")?;
    let cores = u32::try_from(cores)
        .map_err(|_| malformed(path, tokens.line, "core count is too large"))?;

    let mut entries = Vec::new();
    for index in 1..=count {
        let start = tokens.number(&format!("start time of process {index}"))?;
        let duration = tokens.number(&format!("duration of process {index}"))?;
        entries.push(ProcessEntry { start, duration });
    }

    if let Some((line, token)) = tokens.next() {
        warn!(
            path = %path.display(),
            line,
            token,
            "Ignoring trailing input in process table"
        );
    }

    Ok(ProcessTable { cores, entries })
}

/// Non-blank lines, trimmed.
pub fn parse_commands(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Deals `commands` out to `count` lists in turn. With no processes every
/// command is dropped.
pub fn distribute_round_robin(commands: Vec<String>, count: usize) -> Vec<Vec<String>> {
    if count == 0 {
        if !commands.is_empty() {
            warn!(
                commands = commands.len(),
                "No processes configured, dropping all commands"
            );
        }
        return Vec::new();
    }

    let mut lists = vec![Vec::new(); count];
    for (index, command) in commands.into_iter().enumerate() {
        lists[index % count].push(command);
    }
    lists
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(PathBuf::from(path)),
        _ => ConfigError::Io(e),
    })
}

fn malformed(path: &Path, line: usize, reason: impl Into<String>) -> ConfigError {
    ConfigError::Malformed {
        path: PathBuf::from(path),
        line,
        reason: reason.into(),
    }
}

/// Whitespace tokens annotated with their 1-based line number.
struct Tokens<'a> {
    path: &'a Path,
    inner: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str, path: &'a Path) -> Self {
        let inner = text
            .lines()
            .enumerate()
            .flat_map(|(index, line)| line.split_whitespace().map(move |token| (index + 1, token)));
        Self {
            path,
            inner: Box::new(inner),
            line: 1,
        }
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let item = self.inner.next()?;
        self.line = item.0;
        Some(item)
    }

    fn number(&mut self, what: &str) -> Result<u64, ConfigError> {
        let (line, token) = self
            .next()
            .ok_or_else(|| malformed(self.path, self.line, format!("missing {what}")))?;
        token.parse::<u64>().map_err(|_| {
            malformed(
                self.path,
                line,
                format!("{what} must be a non-negative integer, got {token:?}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn path() -> &'static Path {
        Path::new("input.txt")
    }

    #[test]
    fn capacity_reads_first_token() {
        assert_eq!(parse_capacity("  3\n", path()).unwrap(), 3);
        assert_eq!(parse_capacity("0", path()).unwrap(), 0);
    }

    #[test]
    fn capacity_rejects_negative_and_missing() {
        let negative = parse_capacity("-2", path()).unwrap_err();
        assert!(negative.to_string().contains("non-negative"), "{negative}");

        let missing = parse_capacity("\n\n", path()).unwrap_err();
        assert!(matches!(missing, ConfigError::Malformed { line: 1, .. }));

        let garbage = parse_capacity("lots", path()).unwrap_err();
        assert!(garbage.to_string().contains("\"lots\""), "{garbage}");
    }

    #[test]
    fn process_table_spans_lines() {
        let table = parse_process_table("2\n3\n1 3\n2 4\n  5 1", path()).unwrap();
        assert_eq!(table.cores, 2);
        assert_eq!(
            table.entries,
            vec![
                ProcessEntry {
                    start: 1,
                    duration: 3
                },
                ProcessEntry {
                    start: 2,
                    duration: 4
                },
                ProcessEntry {
                    start: 5,
                    duration: 1
                },
            ]
        );
    }

    #[test]
    fn process_table_reports_line_of_bad_token() {
        let error = parse_process_table("2 2\n1 3\n2 x\n", path()).unwrap_err();
        match error {
            ConfigError::Malformed { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.contains("duration of process 2"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn process_table_reports_truncation() {
        let error = parse_process_table("2 3\n1 3\n", path()).unwrap_err();
        assert!(error.to_string().contains("start time of process 2"));
    }

    #[test]
    fn commands_skip_blank_lines() {
        let commands = parse_commands("Store 1 5\n\n  Lookup 1  \nRelease 1\n");
        assert_eq!(commands, vec!["Store 1 5", "Lookup 1", "Release 1"]);
    }

    #[test]
    fn round_robin_distribution() {
        let commands = (0..5).map(|i| format!("Lookup {i}")).collect();
        let lists = distribute_round_robin(commands, 2);
        assert_eq!(lists[0], vec!["Lookup 0", "Lookup 2", "Lookup 4"]);
        assert_eq!(lists[1], vec!["Lookup 1", "Lookup 3"]);
        assert!(distribute_round_robin(vec!["Lookup 1".into()], 0).is_empty());
    }

    #[test]
    fn assemble_scales_times_and_numbers_from_one() {
        let table = ProcessTable {
            cores: 2,
            entries: vec![
                ProcessEntry {
                    start: 1,
                    duration: 3,
                },
                ProcessEntry {
                    start: 2,
                    duration: 2,
                },
            ],
        };
        let workload = Workload::assemble(
            2,
            &table,
            vec!["Store a 1".into(), "Store b 2".into(), "Lookup a".into()],
            100,
        );

        assert_eq!(workload.capacity, 2);
        assert_eq!(
            workload.processes[0],
            ProcessSpec {
                id: 1,
                start: 100,
                duration: 300,
                commands: vec!["Store a 1".into(), "Lookup a".into()],
            }
        );
        assert_eq!(workload.processes[1].id, 2);
        assert_eq!(workload.processes[1].start, 200);
        assert_eq!(workload.processes[1].commands, vec!["Store b 2"]);
    }

    #[test]
    fn load_reads_all_files() {
        Jail::expect_with(|jail| {
            jail.create_file("memconfig.txt", "2\n")?;
            jail.create_file("processes.txt", "2 2\n1 3\n2 3\n")?;
            jail.create_file("commands.txt", "Store 1 5\nStore 2 3\nLookup 1\n")?;

            let config = MemtierConfig::default();
            let workload = Workload::load(&config).map_err(|e| e.to_string())?;
            assert_eq!(workload.capacity, 2);
            assert_eq!(workload.processes.len(), 2);
            assert_eq!(workload.processes[0].commands.len(), 2);
            Ok(())
        });
    }

    #[test]
    fn configured_capacity_skips_memconfig() {
        Jail::expect_with(|jail| {
            jail.create_file("processes.txt", "1 1\n0 1\n")?;
            jail.create_file("commands.txt", "")?;

            let mut config = MemtierConfig::default();
            config.memory.capacity = Some(7);
            let workload = Workload::load(&config).map_err(|e| e.to_string())?;
            assert_eq!(workload.capacity, 7);
            Ok(())
        });
    }

    #[test]
    fn missing_input_file_is_reported() {
        Jail::expect_with(|_| {
            let result = Workload::load(&MemtierConfig::default());
            assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
            Ok(())
        });
    }
}
