//! Duplicate image detection, run before rendering so an accidental
//! double paste can be fixed before a long build.

use std::collections::BTreeMap;
use std::path::Path;

use crate::markdown::{image_path, is_image_line};

/// An image path referenced on more than one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateImage {
    pub path: String,
    /// 1-based line numbers, ascending.
    pub line_numbers: Vec<usize>,
}

impl DuplicateImage {
    /// File name for display.
    pub fn file_name(&self) -> String {
        Path::new(&self.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.clone())
    }
}

/// Every image path that appears on more than one line, sorted by path.
pub fn find_duplicate_images(source: &str) -> Vec<DuplicateImage> {
    let mut locations: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, line) in source.lines().enumerate() {
        if !is_image_line(line) {
            continue;
        }
        if let Some(path) = image_path(line) {
            locations.entry(path).or_default().push(idx + 1);
        }
    }

    locations
        .into_iter()
        .filter(|(_, lines)| lines.len() > 1)
        .map(|(path, line_numbers)| DuplicateImage { path, line_numbers })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_duplicates() {
        let source = "# Title\n/p/a.jpg\n/p/b.jpg\n";
        assert!(find_duplicate_images(source).is_empty());
    }

    #[test]
    fn reports_lines_sorted_by_path() {
        let source = "/p/z.jpg\ntext\n/p/a.jpg\n/p/z.jpg\n\n/p/a.jpg\n/p/z.jpg\n";
        let dups = find_duplicate_images(source);
        assert_eq!(
            dups,
            vec![
                DuplicateImage {
                    path: "/p/a.jpg".to_string(),
                    line_numbers: vec![3, 6],
                },
                DuplicateImage {
                    path: "/p/z.jpg".to_string(),
                    line_numbers: vec![1, 4, 7],
                },
            ]
        );
        assert_eq!(dups[0].file_name(), "a.jpg");
    }

    #[test]
    fn escaped_and_listed_paths_match() {
        let source = "- /p/DJI\\_0001.jpg\n/p/DJI_0001.jpg {layout=full}\n";
        let dups = find_duplicate_images(source);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].path, "/p/DJI_0001.jpg");
    }
}
