//! Common test utilities and helpers.
//!
//! Fixtures live under `samples/`: `samples/core` is a miniature firmware
//! `core/` checkout, `samples/firmware` holds captured tool output for it.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use binsize::SourceLayout;

/// Get the full path to a sample file
pub fn sample_file_path<P: AsRef<Path>>(relative_path: P) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("samples")
        .join(relative_path)
}

/// Read a sample file, panicking with its path on failure
pub fn read_sample<P: AsRef<Path>>(relative_path: P) -> String {
    let path = sample_file_path(relative_path);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read sample {:?}: {}", path, e))
}

/// Layout rooted at the sample firmware core directory
pub fn sample_layout() -> SourceLayout {
    SourceLayout::with_core_dir(sample_file_path("core"))
}

/// Sections the firmware is analysed for
pub fn flash_sections() -> Vec<String> {
    vec![".flash".to_string(), ".flash2".to_string()]
}

pub mod test_data {
    /// Size-tool CSV for the sample firmware
    pub const FIRMWARE_CSV: &str = "firmware/firmware.csv";

    /// GNU ld map for the sample firmware
    pub const FIRMWARE_MAP: &str = "firmware/firmware.map";

    /// Symbol-table output for the sample firmware
    pub const FIRMWARE_NM: &str = "firmware/firmware.nm.txt";

    /// Total size of `.flash` and `.flash2` in the CSV
    pub const FLASH_TOTAL: u64 = 4364;
}

/// Copy the sample core tree into a fresh temporary directory.
pub fn copy_sample_core() -> tempfile::TempDir {
    fn copy_dir(from: &Path, to: &Path) {
        std::fs::create_dir_all(to).unwrap();
        for entry in std::fs::read_dir(from).unwrap() {
            let entry = entry.unwrap();
            let target = to.join(entry.file_name());
            if entry.file_type().unwrap().is_dir() {
                copy_dir(&entry.path(), &target);
            } else {
                std::fs::copy(entry.path(), target).unwrap();
            }
        }
    }

    let dir = tempfile::tempdir().unwrap();
    copy_dir(&sample_file_path("core"), dir.path());
    dir
}
