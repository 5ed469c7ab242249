use std::path::{Path, PathBuf};

/// File name for the image exported at `index`.
/// e.g. "dumpframe-000042.jpg"; indices past six digits are written in full.
pub fn export_file_name(prefix: &str, index: u64) -> String {
    format!("{prefix}-{index:06}.jpg")
}

pub fn export_path(dir: &Path, prefix: &str, index: u64) -> PathBuf {
    dir.join(export_file_name(prefix, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_format() {
        assert_eq!(export_file_name("dumpframe", 0), "dumpframe-000000.jpg");
        assert_eq!(export_file_name("dumpframe", 42), "dumpframe-000042.jpg");
        assert_eq!(export_file_name("snap", 1234567), "snap-1234567.jpg");
    }

    #[test]
    fn names_sort_in_index_order() {
        let mut names: Vec<String> = [10u64, 2, 0, 4]
            .iter()
            .map(|&i| export_file_name("dumpframe", i))
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "dumpframe-000000.jpg",
                "dumpframe-000002.jpg",
                "dumpframe-000004.jpg",
                "dumpframe-000010.jpg"
            ]
        );
    }

    #[test]
    fn path_lives_in_output_dir() {
        let p = export_path(Path::new("/var/frames"), "dumpframe", 6);
        assert_eq!(p, PathBuf::from("/var/frames/dumpframe-000006.jpg"));
    }
}
