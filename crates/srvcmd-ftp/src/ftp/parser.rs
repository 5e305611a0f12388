//! `LIST` response parser (Unix `ls -l` style).
//!
//! ```text
//! drwxr-xr-x   2 user group  4096 Jan  1 12:00 dirname
//! -rw-r--r--   1 user group  1234 Jan  1  2025 file with spaces.txt
//! ```
//!
//! Lines with at least nine whitespace-separated fields are split into
//! their parts; anything shorter is kept verbatim as the entry name. No
//! line is ever dropped.

use crate::ftp::types::{FtpEntry, FtpEntryKind};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Parse one raw `LIST` line.
pub fn parse_list_line(raw: &str) -> FtpEntry {
    parse_list_line_at(raw, Utc::now())
}

/// Parse one raw line, resolving year-less timestamps relative to `now`.
pub fn parse_list_line_at(raw: &str, now: DateTime<Utc>) -> FtpEntry {
    let fields: Vec<&str> = raw.split_whitespace().collect();
    if fields.len() < 9 {
        return FtpEntry {
            name: raw.to_string(),
            size: 0,
            modified: None,
            kind: FtpEntryKind::Unknown,
            permissions: None,
            owner: None,
            group: None,
            raw: raw.to_string(),
        };
    }

    let perms = fields[0];
    let kind = match perms.as_bytes().first() {
        Some(b'd') => FtpEntryKind::Directory,
        Some(b'l') => FtpEntryKind::Symlink,
        Some(b'-') => FtpEntryKind::File,
        _ => FtpEntryKind::Unknown,
    };

    FtpEntry {
        name: fields[8..].join(" "),
        size: fields[4].parse::<u64>().unwrap_or(0),
        modified: parse_list_time(fields[5], fields[6], fields[7], now),
        kind,
        permissions: Some(perms.to_string()),
        owner: Some(fields[2].to_string()),
        group: Some(fields[3].to_string()),
        raw: raw.to_string(),
    }
}

/// Parse the three date fields: `Jan 5 12:30` or `Jan 5 2023`.
///
/// The time-of-day form omits the year; it is the current year unless that
/// lands more than a day in the future, in which case it is last year.
fn parse_list_time(
    month: &str,
    day: &str,
    time_or_year: &str,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let with_time = |year: i32| {
        let text = format!("{} {} {} {}", year, month, day, time_or_year);
        NaiveDateTime::parse_from_str(&text, "%Y %b %d %H:%M").ok()
    };

    if let Some(dt) = with_time(now.year()) {
        let dt = Utc.from_utc_datetime(&dt);
        if dt > now + Duration::days(1) {
            return with_time(now.year() - 1).map(|d| Utc.from_utc_datetime(&d));
        }
        return Some(dt);
    }

    let text = format!("{} {} {}", month, day, time_or_year);
    let date = NaiveDate::parse_from_str(&text, "%b %d %Y").ok()?;
    let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&date.and_time(midnight)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn unix_file() {
        let e = parse_list_line_at(
            "-rw-r--r-- 1 user group 1024 Jan 5 12:30 notes.txt",
            at(2026, 6, 1),
        );
        assert_eq!(e.name, "notes.txt");
        assert_eq!(e.size, 1024);
        assert!(!e.is_dir());
        assert_eq!(e.kind, FtpEntryKind::File);
        assert_eq!(
            e.modified,
            Some(Utc.with_ymd_and_hms(2026, 1, 5, 12, 30, 0).unwrap())
        );
        assert_eq!(e.owner.as_deref(), Some("user"));
    }

    #[test]
    fn unix_dir() {
        let e = parse_list_line("drwxr-xr-x   2 root root  4096 Mar  1 09:30 subdir");
        assert!(e.is_dir());
        assert_eq!(e.name, "subdir");
        assert!(e.modified.is_some());
    }

    #[test]
    fn year_form() {
        let e = parse_list_line("-rw-r--r-- 1 u g 77 Dec 31 2019 old.log");
        assert_eq!(
            e.modified,
            Some(Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn future_time_rolls_back_a_year() {
        let e = parse_list_line_at("-rw-r--r-- 1 u g 1 Dec 20 23:59 late", at(2026, 1, 10));
        assert_eq!(
            e.modified,
            Some(Utc.with_ymd_and_hms(2025, 12, 20, 23, 59, 0).unwrap())
        );
    }

    #[test]
    fn name_keeps_embedded_spaces() {
        let e = parse_list_line("-rw-r--r-- 1 u g 10 Jan 5 12:30 q3  report final.pdf");
        assert_eq!(e.name, "q3 report final.pdf");
    }

    #[test]
    fn symlink_name_is_verbatim() {
        let e = parse_list_line("lrwxrwxrwx 1 root root 22 Jan 5 08:00 link -> /var/target");
        assert_eq!(e.kind, FtpEntryKind::Symlink);
        assert_eq!(e.name, "link -> /var/target");
        assert!(!e.is_dir());
    }

    #[test]
    fn bad_size_and_time_still_produce_entry() {
        let e = parse_list_line("-rw-r--r-- 1 u g huge Foo 99 zz:zz weird.bin");
        assert_eq!(e.name, "weird.bin");
        assert_eq!(e.size, 0);
        assert!(e.modified.is_none());
    }

    #[test]
    fn negative_size_parses_as_zero() {
        let e = parse_list_line("-rw-r--r-- 1 u g -512 Jan 5 08:00 odd.bin");
        assert_eq!(e.name, "odd.bin");
        assert_eq!(e.size, 0);
    }

    #[test]
    fn short_lines_pass_through() {
        for raw in ["total 12", "", "just-a-name.txt"] {
            let e = parse_list_line(raw);
            assert_eq!(e.name, raw);
            assert_eq!(e.raw, raw);
            assert_eq!(e.size, 0);
            assert!(!e.is_dir());
            assert!(e.modified.is_none());
        }
    }

    #[test]
    fn feb_29_on_non_leap_year_falls_back_cleanly() {
        // 2025 is not a leap year: the time form fails, the year form fails too.
        let e = parse_list_line_at("-rw-r--r-- 1 u g 5 Feb 29 10:00 leap.txt", at(2025, 6, 1));
        assert_eq!(e.name, "leap.txt");
        assert!(e.modified.is_none());
    }
}
