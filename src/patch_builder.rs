use std::fmt::Write as _;

use similar::{Algorithm, TextDiff};

/// Build a unified diff turning `original` into `edited`, with
/// `context_lines` unchanged lines around every change.
///
/// Hunks separated by at most `2 * context_lines` unchanged lines are joined.
/// Identical inputs yield the `Index:` header only, which must not be
/// uploaded; callers are expected to skip the upload before getting here.
///
/// ```
/// use usfm_save::build_patch;
///
/// let patch = build_patch("57-TIT.usfm", "\\v 1 Paul,\n", "\\v 1 Paul, servant\n", 3);
/// assert!(patch.ends_with("@@ -1 +1 @@\n-\\v 1 Paul,\n+\\v 1 Paul, servant\n"));
/// ```
pub fn build_patch(file_name: &str, original: &str, edited: &str, context_lines: usize) -> String {
    // A last line without a newline gets a `\ No newline at end of file` marker
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .newline_terminated(true)
        .diff_lines(original, edited);

    let mut patch = String::new();
    let _ = writeln!(patch, "Index: {file_name}");
    patch.push_str("===================================================================\n");
    let _ = write!(
        patch,
        "{}",
        diff.unified_diff()
            .context_radius(context_lines)
            .header(file_name, file_name)
    );

    patch
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    const ORIGINAL: &str = "\\id TIT\n\\c 1\n\\v 1 Paul,\n\\v 2 Titus\n";
    const EDITED: &str = "\\id TIT\n\\c 1\n\\v 1 Paul, servant\n\\v 2 Titus\n";

    #[test]
    fn test_single_change() {
        assert_snapshot!(build_patch("57-TIT.usfm", ORIGINAL, EDITED, 1), @r"
Index: 57-TIT.usfm
===================================================================
--- 57-TIT.usfm
+++ 57-TIT.usfm
@@ -2,3 +2,3 @@
 \c 1
-\v 1 Paul,
+\v 1 Paul, servant
 \v 2 Titus
");
    }

    #[test]
    fn test_context_is_clamped_to_the_document() {
        let patch = build_patch("57-TIT.usfm", ORIGINAL, EDITED, 10);

        assert!(patch.contains("@@ -1,4 +1,4 @@\n \\id TIT\n \\c 1\n-\\v 1 Paul,\n"));
    }

    #[test]
    fn test_distant_changes_make_separate_hunks() {
        let original = "a\nb\nc\nd\ne\nf\ng\nh\ni\nj\n";
        let edited = "a\nB\nc\nd\ne\nf\ng\nh\nI\nj\n";

        let patch = build_patch("f", original, edited, 2);

        assert_eq!(
            patch.lines().skip(4).collect::<Vec<_>>(),
            vec![
                "@@ -1,4 +1,4 @@",
                " a",
                "-b",
                "+B",
                " c",
                " d",
                "@@ -7,4 +7,4 @@",
                " g",
                " h",
                "-i",
                "+I",
                " j",
            ]
        );
    }

    #[test_case(0, 2; "no context")]
    #[test_case(1, 2; "gap wider than twice the context")]
    #[test_case(2, 1; "gap within twice the context")]
    #[test_case(3, 1; "overlapping context")]
    fn test_hunks_merge_when_close(context_lines: usize, expected_hunks: usize) {
        // Changes on lines 2 and 6 leave three unchanged lines between them
        let original = "1\n2\n3\n4\n5\n6\n7\n";
        let edited = "1\nX\n3\n4\n5\nY\n7\n";

        let patch = build_patch("f", original, edited, context_lines);

        assert_eq!(patch.matches("@@ -").count(), expected_hunks);
    }

    #[test]
    fn test_missing_trailing_newline() {
        let patch = build_patch("f", "a\nb", "a\nc", 0);

        assert_eq!(
            patch.lines().skip(4).collect::<Vec<_>>(),
            vec![
                "@@ -2 +2 @@",
                "-b",
                "\\ No newline at end of file",
                "+c",
                "\\ No newline at end of file",
            ]
        );
    }

    #[test]
    fn test_pure_insertion_and_deletion_headers() {
        let inserted = build_patch("f", "a\n", "a\nb\n", 0);
        assert!(inserted.ends_with("@@ -1,0 +2 @@\n+b\n"));

        let deleted = build_patch("f", "a\nb\n", "a\n", 0);
        assert!(deleted.ends_with("@@ -2 +1,0 @@\n-b\n"));

        let from_empty = build_patch("f", "", "a\n", 3);
        assert!(from_empty.ends_with("@@ -0,0 +1 @@\n+a\n"));
    }

    #[test]
    fn test_identical_documents_have_no_hunks() {
        let patch = build_patch("f", ORIGINAL, ORIGINAL, 4);

        assert_eq!(
            patch,
            "Index: f\n===================================================================\n"
        );
    }

    #[test]
    fn test_deterministic() {
        let original = "\\c 1\n\\v 1 a\n\\v 2 b\n\\v 3 c\n\\c 2\n\\v 1 d\n";
        let edited = "\\c 1\n\\v 1 A\n\\v 2 b\n\\v 3 c\n\\c 2\n\\v 1 D\n\\v 2 e\n";

        assert_eq!(
            build_patch("f", original, edited, 4),
            build_patch("f", original, edited, 4)
        );
    }
}
