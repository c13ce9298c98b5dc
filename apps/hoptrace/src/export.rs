use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// `<root>/net-commander/traceroute/traceroute-YYMMDD-HHMM.csv`
pub fn export_path<Tz: TimeZone>(root: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    root.join("net-commander")
        .join("traceroute")
        .join(format!("traceroute-{}.csv", now.format("%y%m%d-%H%M")))
}

/// Writes `csv` to its timestamped export path. The file appears complete
/// or not at all: the bytes go to a sibling `.tmp` file that is renamed
/// over the export.
pub fn write_csv_export<Tz: TimeZone>(root: &Path, csv: &str, now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let path = export_path(root, now);
    let dir = path.parent().unwrap_or(root);
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;

    let staging = path.with_extension("csv.tmp");
    let written = fs::File::create(&staging).and_then(|mut file| {
        file.write_all(csv.as_bytes())?;
        file.sync_all()
    });
    if let Err(err) = written.and_then(|()| fs::rename(&staging, &path)) {
        let _ = fs::remove_file(&staging);
        return Err(err).with_context(|| format!("failed to write export {}", path.display()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 7)
            .unwrap()
    }

    #[test]
    fn export_path_uses_short_timestamp() {
        let path = export_path(Path::new("/work"), &at(2026, 3, 4, 9, 5));
        let expected = Path::new("/work")
            .join("net-commander")
            .join("traceroute")
            .join("traceroute-260304-0905.csv");
        assert_eq!(path, expected);
    }

    #[test]
    fn unwritable_root_reports_path() {
        let root = std::env::temp_dir().join(format!("hoptrace-blocked-{}", std::process::id()));
        fs::write(&root, "not a directory").unwrap();

        let err = write_csv_export(&root, "NodeID,Label\n", &at(2026, 1, 2, 3, 4)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to create export directory"));
        let _ = fs::remove_file(&root);
    }

    #[test]
    fn write_replaces_existing_export() {
        let root = std::env::temp_dir().join(format!("hoptrace-export-{}", std::process::id()));
        let now = at(2026, 10, 18, 12, 30);

        let first = write_csv_export(&root, "NodeID,Label\n", &now).unwrap();
        let second = write_csv_export(&root, "NodeID,Label\nsource,x\n", &now).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second).unwrap(), "NodeID,Label\nsource,x\n");
        let leftovers: Vec<_> = fs::read_dir(second.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("traceroute-261018-1230.csv")]);
        let _ = fs::remove_dir_all(&root);
    }
}
