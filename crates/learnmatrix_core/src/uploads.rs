//! crates/learnmatrix_core/src/uploads.rs
//!
//! Validation rules for user-uploaded files: which extensions are
//! acceptable where, and how stored filenames are built so concurrent
//! uploads never collide.

use uuid::Uuid;

/// Image types accepted on a doubt.
pub const DOUBT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Document types accepted as an assignment submission.
pub const SUBMISSION_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "jpg", "jpeg", "png", "xls", "xlsx", "ppt", "pptx",
];

/// Lowercased extension of a filename, if it has one.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn has_allowed_extension(filename: &str, allowed: &[&str]) -> bool {
    extension(filename).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

/// Reduces a client-supplied filename to a safe flat name: path
/// separators and anything outside [A-Za-z0-9._-] become underscores,
/// and leading dots are stripped so the name can never be hidden or
/// escape its directory.
pub fn sanitize_filename(original: &str) -> String {
    let cleaned: String = original
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Stored name for a doubt image: timestamp-prefixed sanitized original.
/// `None` when the extension is not an accepted image type.
pub fn stored_doubt_image_name(timestamp_secs: i64, original: &str) -> Option<String> {
    if !has_allowed_extension(original, DOUBT_IMAGE_EXTENSIONS) {
        return None;
    }
    Some(format!("{}_{}", timestamp_secs, sanitize_filename(original)))
}

/// Stored name for an assignment submission: `<student>_<timestamp>.<ext>`.
/// The original name is kept separately for display; the stored name only
/// needs to be unique and typed. `None` when the extension is not allowed.
pub fn stored_submission_name(
    student_id: Uuid,
    timestamp_secs: i64,
    original: &str,
) -> Option<String> {
    let ext = extension(original)?;
    if !SUBMISSION_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(format!("{}_{}.{}", student_id, timestamp_secs, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_case_insensitive() {
        assert!(has_allowed_extension("Notes.PDF", SUBMISSION_EXTENSIONS));
        assert!(has_allowed_extension("scan.JPeG", DOUBT_IMAGE_EXTENSIONS));
    }

    #[test]
    fn rejects_disallowed_and_extensionless_names() {
        assert!(!has_allowed_extension("payload.exe", SUBMISSION_EXTENSIONS));
        assert!(!has_allowed_extension("README", SUBMISSION_EXTENSIONS));
        assert!(!has_allowed_extension(".gitignore", DOUBT_IMAGE_EXTENSIONS));
    }

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("my report (final).pdf"), "my_report__final_.pdf");
    }

    #[test]
    fn doubt_image_name_is_timestamp_prefixed() {
        let name = stored_doubt_image_name(1_700_000_000, "graph.png").unwrap();
        assert_eq!(name, "1700000000_graph.png");
        assert!(stored_doubt_image_name(1_700_000_000, "graph.pdf").is_none());
    }

    #[test]
    fn submission_name_is_keyed_by_student_and_time() {
        let student = Uuid::nil();
        let name = stored_submission_name(student, 1_700_000_000, "Homework.DOCX").unwrap();
        assert_eq!(name, format!("{}_1700000000.docx", student));
        assert!(stored_submission_name(student, 1_700_000_000, "virus.sh").is_none());
    }
}
