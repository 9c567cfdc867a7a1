//! # List
//!
//! Parsers for directory listings: the machine-readable MLSD format
//! (`fact=value;...;<SP>name`) and the traditional Unix `ls -l` format.
//!
//! There is no specification for the LIST output, so the Unix parser is
//! necessarily approximate; it has worked on every server this crate was
//! tried against. Lines it cannot make sense of (such as the `total 42`
//! header some servers emit) are skipped.
//!
//! ## Get started
//!
//! ```rust
//! use ftpwire::list::DirEntry;
//!
//! let entry = DirEntry::from_mlsd_line("type=file;modify=20180608233854;size=419616; steam.dll")
//!     .unwrap();
//! assert_eq!(entry.name(), "steam.dll");
//! assert_eq!(entry.size(), 419616);
//! ```

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use lazy_regex::{Lazy, Regex};
use thiserror::Error;

// -- Regex

/// Unix `ls -l` line: type char, permissions with optional ACL marker, link
/// count, owner, group, size (or `major, minor` for devices), date in one of
/// three shapes, time-or-year, name.
static UNIX_LS_RE: Lazy<Regex> = lazy_regex!(
    r#"^([bcdelfmpSs-])([-rwxsStT]{9})\+?\s+(\d+)\s+(\S+)\s+(\S+)\s+(\d+(?:,\s*\d+)?)\s+((?:\d{4}-\d{2}-\d{2})|(?:[A-Za-z]{3}\s+\d{1,2})|(?:\d{1,2}\s+[A-Za-z]{3}))\s+(\d{1,2}:\d{2}|\d{4})\s+(.+)$"#
);

// -- Dir entry

/// What kind of remote object a listing entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Unknown,
}

impl EntryKind {
    fn as_mlsd_fact(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Dir => "dir",
            EntryKind::Symlink => "link",
            EntryKind::Unknown => "unknown",
        }
    }
}

/// Describes one entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    name: String,
    size: u64,
    modified: Option<DateTime<Utc>>,
    kind: EntryKind,
}

// -- Error

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("Syntax error: invalid line")]
    SyntaxError,
    #[error("Invalid date")]
    InvalidDate,
    #[error("Bad file size")]
    BadSize,
}

impl DirEntry {
    // -- getters

    /// Entry name, relative to the listed directory.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Size in bytes; 0 when the listing carried none.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Last modification time, when the listing carried one.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    // -- parsers

    /// Parse an output line from an MLSD command.
    ///
    /// Fact keys are case-insensitive; unknown facts are ignored. The
    /// `cdir`/`pdir` marker entries parse with [`EntryKind::Unknown`] so kind
    /// filters drop them.
    pub fn from_mlsd_line(line: &str) -> Result<Self, ParseError> {
        let tokens: Vec<&str> = line.split(';').collect();
        let (name_token, facts) = tokens.split_last().ok_or(ParseError::SyntaxError)?;
        let name = name_token.strip_prefix(' ').unwrap_or(name_token);
        if name.is_empty() {
            return Err(ParseError::SyntaxError);
        }

        let mut entry = DirEntry {
            name: name.to_string(),
            size: 0,
            modified: None,
            kind: EntryKind::Unknown,
        };
        for fact in facts {
            let Some((key, value)) = fact.split_once('=') else {
                continue;
            };
            match key.to_lowercase().as_str() {
                "type" => {
                    entry.kind = match value.to_lowercase().as_str() {
                        "file" => EntryKind::File,
                        "dir" => EntryKind::Dir,
                        "link" => EntryKind::Symlink,
                        // cdir/pdir markers and OS-specific types
                        _ => EntryKind::Unknown,
                    };
                }
                "size" => {
                    entry.size = value.parse::<u64>().map_err(|_| ParseError::BadSize)?;
                }
                "modify" => {
                    entry.modified = Some(parse_mlsd_time(value)?);
                }
                _ => continue,
            }
        }

        Ok(entry)
    }

    /// Parse a Unix `ls -l` output line.
    pub fn from_unix_line(line: &str) -> Result<Self, ParseError> {
        let caps = UNIX_LS_RE.captures(line).ok_or(ParseError::SyntaxError)?;

        let kind = match &caps[1] {
            "d" => EntryKind::Dir,
            "e" | "l" => EntryKind::Symlink,
            "b" | "f" | "-" => EntryKind::File,
            _ => EntryKind::Unknown,
        };

        // device entries carry `major, minor` instead of a byte size
        let size_field = &caps[6];
        let size = if size_field.contains(',') {
            0
        } else {
            size_field.parse::<u64>().map_err(|_| ParseError::BadSize)?
        };

        let modified = parse_unix_time(&caps[7], &caps[8])?;

        let mut name = caps[9].to_string();
        if kind == EntryKind::Symlink {
            // drop the ` -> target` suffix
            if let Some((link_name, _)) = name.split_once(" -> ") {
                name = link_name.to_string();
            }
        }

        trace!("parsed ls line: {name} ({kind:?}, {size} bytes)");
        Ok(DirEntry {
            name,
            size,
            modified: Some(modified),
            kind,
        })
    }
}

/// The MLSD textual form of the entry; parsing it back yields an equal
/// entry.
impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type={}", self.kind.as_mlsd_fact())?;
        if let Some(modified) = self.modified {
            write!(f, ";modify={}", modified.format("%Y%m%d%H%M%S"))?;
        }
        write!(f, ";size={}; {}", self.size, self.name)
    }
}

// -- listing helpers

/// Parse a full MLSD payload, dropping `.`/`..` entries and unparsable
/// lines.
pub fn parse_mlsd_listing(payload: &str) -> Vec<DirEntry> {
    parse_lines(payload, DirEntry::from_mlsd_line)
}

/// Parse a full Unix LIST payload, dropping `.`/`..` entries and unparsable
/// lines.
pub fn parse_unix_listing(payload: &str) -> Vec<DirEntry> {
    parse_lines(payload, DirEntry::from_unix_line)
}

fn parse_lines(
    payload: &str,
    parse: fn(&str) -> Result<DirEntry, ParseError>,
) -> Vec<DirEntry> {
    payload
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parse(line) {
            Ok(entry) => Some(entry),
            Err(err) => {
                trace!("skipping listing line {line:?}: {err}");
                None
            }
        })
        .filter(|entry| entry.name() != "." && entry.name() != "..")
        .collect()
}

// -- time parsing

/// `YYYYMMDDHHMMSS`, always UTC.
fn parse_mlsd_time(value: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(value, "%Y%m%d%H%M%S")
        .map(|dt| dt.and_utc())
        .map_err(|_| ParseError::InvalidDate)
}

/// The `ls` date column comes in three shapes (`2018-06-08`, `Nov 5`,
/// `5 Nov`); the following column is either a `HH:MM` clock (entry modified
/// in the current year) or a four-digit year.
fn parse_unix_time(date: &str, clock: &str) -> Result<DateTime<Utc>, ParseError> {
    let date = date.split_whitespace().collect::<Vec<&str>>().join(" ");
    let clock_is_time = clock.contains(':');

    let day = if date.contains('-') {
        NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| ParseError::InvalidDate)?
    } else {
        let fmt = if date.starts_with(|c: char| c.is_ascii_alphabetic()) {
            "%b %d %Y"
        } else {
            "%d %b %Y"
        };
        let year = if clock_is_time {
            Utc::now().year()
        } else {
            clock.parse::<i32>().map_err(|_| ParseError::InvalidDate)?
        };
        NaiveDate::parse_from_str(&format!("{date} {year}"), fmt)
            .map_err(|_| ParseError::InvalidDate)?
    };

    let time = if clock_is_time {
        NaiveTime::parse_from_str(clock, "%H:%M").map_err(|_| ParseError::InvalidDate)?
    } else {
        NaiveTime::MIN
    };

    Ok(NaiveDateTime::new(day, time).and_utc())
}

#[cfg(test)]
mod test {

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_mlsd_file_line() {
        let entry =
            DirEntry::from_mlsd_line("type=file;modify=20180608233854;size=419616; steam.dll")
                .unwrap();
        assert_eq!(entry.name(), "steam.dll");
        assert_eq!(entry.size(), 419616);
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(
            entry.modified(),
            Some(Utc.with_ymd_and_hms(2018, 6, 8, 23, 38, 54).unwrap())
        );
    }

    #[test]
    fn parse_mlsd_dir_line() {
        let entry = DirEntry::from_mlsd_line("type=dir;modify=20180702203936; steamapps").unwrap();
        assert_eq!(entry.name(), "steamapps");
        assert_eq!(entry.size(), 0);
        assert!(entry.is_dir());
    }

    #[test]
    fn parse_mlsd_fact_keys_are_case_insensitive() {
        let entry = DirEntry::from_mlsd_line("Type=file;Size=42; a.txt").unwrap();
        assert!(entry.is_file());
        assert_eq!(entry.size(), 42);
    }

    #[test]
    fn parse_mlsd_marker_entries_are_unknown() {
        let entry = DirEntry::from_mlsd_line("type=cdir;modify=20180702203936; /test").unwrap();
        assert_eq!(entry.kind(), EntryKind::Unknown);
        let entry = DirEntry::from_mlsd_line("type=pdir;modify=20180702203936; ..").unwrap();
        assert_eq!(entry.kind(), EntryKind::Unknown);
    }

    #[test]
    fn parse_mlsd_unknown_facts_are_ignored() {
        let entry =
            DirEntry::from_mlsd_line("type=file;unique=8U1DA1;unix.mode=0644;size=9; a").unwrap();
        assert_eq!(entry.size(), 9);
        assert_eq!(entry.name(), "a");
    }

    #[test]
    fn parse_mlsd_bad_lines() {
        assert_eq!(
            DirEntry::from_mlsd_line("type=file;size=nine; a").unwrap_err(),
            ParseError::BadSize
        );
        assert_eq!(
            DirEntry::from_mlsd_line("type=file;modify=2018; a").unwrap_err(),
            ParseError::InvalidDate
        );
        assert_eq!(
            DirEntry::from_mlsd_line("").unwrap_err(),
            ParseError::SyntaxError
        );
    }

    #[test]
    fn mlsd_round_trip() {
        let lines = [
            "type=file;modify=20180608233854;size=419616; steam.dll",
            "type=dir;modify=20180702203936;size=0; steamapps",
            "type=link;size=11; current",
        ];
        for line in lines {
            let entry = DirEntry::from_mlsd_line(line).unwrap();
            let reparsed = DirEntry::from_mlsd_line(&entry.to_string()).unwrap();
            assert_eq!(reparsed, entry);
        }
    }

    #[test]
    fn parse_unix_file_line() {
        let entry =
            DirEntry::from_unix_line("-rw-rw-r--  1 omar  staff   8192 Nov 5 2018 omar.txt")
                .unwrap();
        assert_eq!(entry.name(), "omar.txt");
        assert_eq!(entry.size(), 8192);
        assert!(entry.is_file());
        assert_eq!(
            entry.modified(),
            Some(Utc.with_ymd_and_hms(2018, 11, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn parse_unix_dir_line() {
        let entry =
            DirEntry::from_unix_line("drwxrwxr-x 2 root dialout 4096 Mar 18 2018 provola").unwrap();
        assert_eq!(entry.name(), "provola");
        assert!(entry.is_dir());
    }

    #[test]
    fn parse_unix_iso_date_line() {
        let entry =
            DirEntry::from_unix_line("-rw-r--r-- 1 web web 1048576 2024-03-01 14:22 site.tar")
                .unwrap();
        assert_eq!(
            entry.modified(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 14, 22, 0).unwrap())
        );
    }

    #[test]
    fn parse_unix_european_date_line() {
        let entry =
            DirEntry::from_unix_line("-rw-r--r-- 1 omar omar 100 5 Nov 2018 report.txt").unwrap();
        assert_eq!(entry.name(), "report.txt");
        assert_eq!(
            entry.modified(),
            Some(Utc.with_ymd_and_hms(2018, 11, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn parse_unix_symlink_line() {
        let entry = DirEntry::from_unix_line(
            "lrwxrwxrwx 1 root root 11 Jan 3 2020 current -> releases/7",
        )
        .unwrap();
        assert!(entry.is_symlink());
        assert_eq!(entry.name(), "current");
    }

    #[test]
    fn parse_unix_device_line() {
        let entry =
            DirEntry::from_unix_line("brw-rw---- 1 root disk 8, 0 Jan 3 2020 sda").unwrap();
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.size(), 0);
        assert_eq!(entry.name(), "sda");
    }

    #[test]
    fn parse_unix_acl_marker_line() {
        let entry =
            DirEntry::from_unix_line("-rw-r--r--+ 1 omar staff 512 Feb 17 2023 notes.txt").unwrap();
        assert_eq!(entry.name(), "notes.txt");
        assert_eq!(entry.size(), 512);
    }

    #[test]
    fn parse_unix_name_starting_with_numbers() {
        let entry = DirEntry::from_unix_line(
            "-r--r--r--    1 23        23         1234567 Jan 1  2000 01 1234 foo.mp3",
        )
        .unwrap();
        assert_eq!(entry.name(), "01 1234 foo.mp3");
        assert_eq!(entry.size(), 1234567);
    }

    #[test]
    fn parse_unix_bad_lines() {
        assert_eq!(
            DirEntry::from_unix_line("total 42").unwrap_err(),
            ParseError::SyntaxError
        );
        assert_eq!(
            DirEntry::from_unix_line("drwxrwxr-x 1 root dialout 4096 Nov 31 2018 provola")
                .unwrap_err(),
            ParseError::InvalidDate
        );
    }

    #[test]
    fn mlsd_listing_filters_markers_and_dot_names() {
        let payload = "type=cdir;modify=20180702203936; /test\r\n\
                       type=pdir;modify=20180702203936; ..\r\n\
                       type=file;modify=20180608233854;size=419616; steam.dll\r\n\
                       type=dir;modify=20180702203936; steamapps\r\n";
        let entries = parse_mlsd_listing(payload);
        assert_eq!(entries.len(), 3);
        let files: Vec<&DirEntry> = entries.iter().filter(|e| e.is_file()).collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "steam.dll");
        let dirs: Vec<&DirEntry> = entries.iter().filter(|e| e.is_dir()).collect();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].name(), "steamapps");
    }

    #[test]
    fn unix_listing_skips_header_and_dot_entries() {
        let payload = "total 12\r\n\
                       drwxr-xr-x 2 omar omar 4096 Nov 5 2018 .\r\n\
                       drwxr-xr-x 9 omar omar 4096 Nov 5 2018 ..\r\n\
                       -rw-r--r-- 1 omar omar  100 Nov 5 2018 a.txt\r\n";
        let entries = parse_unix_listing(payload);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "a.txt");
    }

    #[test]
    fn empty_listing_is_empty() {
        assert!(parse_mlsd_listing("").is_empty());
        assert!(parse_unix_listing("\r\n").is_empty());
    }
}
