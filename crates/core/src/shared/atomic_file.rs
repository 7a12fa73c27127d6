use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temporary sibling used while writing `dest`: `take.wav` -> `take.wav.part`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Writes `bytes` to a `.part` sibling and renames it over `dest`, creating
/// parent directories as needed.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = part_path(dest);
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.flush()?;
    drop(file);

    fs::rename(&temp_path, dest)
}
