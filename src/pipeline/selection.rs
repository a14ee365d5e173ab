//! Chapter selection expressions.
//!
//! `all` selects every chapter; otherwise a comma-separated list of 1-based
//! numbers and inclusive ranges such as `1-10,15`. Ranges past the last
//! chapter are clipped, duplicates collapse, and the result follows catalog
//! order.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::extractors::ChapterRef;

/// Zero-based indices selected by `selection` out of `total` chapters.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for malformed expressions and for
/// expressions that select nothing.
///
/// # Examples
///
/// ```
/// use fontmask::pipeline::select_chapters;
///
/// assert_eq!(select_chapters("2-4,1,3", 10).unwrap(), vec![0, 1, 2, 3]);
/// assert_eq!(select_chapters("all", 3).unwrap(), vec![0, 1, 2]);
/// assert!(select_chapters("20-30", 10).is_err());
/// ```
pub fn select_chapters(selection: &str, total: usize) -> Result<Vec<usize>> {
    let selection = selection.trim();
    let mut selected = BTreeSet::new();

    if selection.eq_ignore_ascii_case("all") {
        selected.extend(0..total);
    } else {
        for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (start, end) = match part.split_once('-') {
                Some((a, b)) => (parse_number(a, part)?, parse_number(b, part)?),
                None => {
                    let n = parse_number(part, part)?;
                    (n, n)
                },
            };
            if start > end {
                return Err(Error::InvalidInput(format!("reversed chapter range '{}'", part)));
            }
            selected.extend((start..=end.min(total)).map(|n| n - 1));
        }
    }

    if selected.is_empty() {
        return Err(Error::InvalidInput(format!(
            "chapter selection '{}' matches none of {} chapters",
            selection, total
        )));
    }
    Ok(selected.into_iter().collect())
}

/// Chapters selected by `selection`, in catalog order.
pub fn apply_selection(chapters: &[ChapterRef], selection: &str) -> Result<Vec<ChapterRef>> {
    Ok(select_chapters(selection, chapters.len())?
        .into_iter()
        .map(|index| chapters[index].clone())
        .collect())
}

fn parse_number(text: &str, part: &str) -> Result<usize> {
    match text.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(Error::InvalidInput(format!(
            "bad chapter number in '{}' (chapters are numbered from 1)",
            part
        ))),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_and_singles() {
        assert_eq!(select_chapters("1-3,5", 10).unwrap(), vec![0, 1, 2, 4]);
        assert_eq!(select_chapters(" 7 ", 10).unwrap(), vec![6]);
        assert_eq!(select_chapters("ALL", 2).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_clipped_and_deduplicated() {
        assert_eq!(select_chapters("8-20,9,9", 10).unwrap(), vec![7, 8, 9]);
    }

    #[test]
    fn test_empty_selection_is_error() {
        assert!(select_chapters("all", 0).is_err());
        assert!(select_chapters("", 10).is_err());
        assert!(select_chapters("11", 10).is_err());
    }

    #[test]
    fn test_malformed() {
        assert!(select_chapters("0", 10).is_err());
        assert!(select_chapters("a-b", 10).is_err());
        assert!(select_chapters("5-2", 10).is_err());
        assert!(select_chapters("1-", 10).is_err());
    }

    #[test]
    fn test_apply_selection() {
        let chapters: Vec<ChapterRef> = (1..=4)
            .map(|i| ChapterRef::new(format!("第{}章", i), format!("https://a/reader/{}", i)))
            .collect();
        let picked = apply_selection(&chapters, "4,2").unwrap();
        let titles: Vec<&str> = picked.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["第2章", "第4章"]);
    }
}
