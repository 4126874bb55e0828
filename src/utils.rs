use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Image types accepted inside batch archives.
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file has one of the specified extensions (case-insensitive)
pub fn has_valid_extension(filename: &str, extensions: &[String]) -> bool {
    match get_file_extension(filename) {
        Some(ext) => extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

/// Last path component of an archive entry name. Handles both separators
/// since archives built on Windows may use backslashes.
pub fn entry_basename(entry_name: &str) -> &str {
    entry_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(entry_name)
}

fn separator_runs() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[_-]+").expect("separator pattern is valid"))
}

/// Derive a person's name from an image filename.
///
/// `photos/Jane_Doe.jpg` -> `Jane Doe`, `Mary%20Jane-Watson.png` -> `Mary Jane Watson`.
/// Filenames that are not valid percent-encoding are used as-is.
pub fn derive_name_from_filename(filename: &str) -> String {
    let basename = entry_basename(filename);
    let stem = Path::new(basename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(basename);

    let decoded = urlencoding::decode(stem)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| stem.to_string());

    separator_runs()
        .replace_all(&decoded, " ")
        .trim()
        .to_string()
}

/// Output archive entry name for a derived name: spaces become underscores
/// and a `.png` extension is appended.
pub fn output_filename(derived_name: &str) -> String {
    let stem = sanitize_filename(&derived_name.replace(' ', "_"));
    format!("{}.png", stem)
}

/// Replace characters that are invalid in archive entries or common
/// filesystems (`/ \ : * ? " < > |` and control characters) with `_`.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        eprintln!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print warning message
pub fn warn_println(message: &str) {
    eprintln!("{} {}", style("[WARNING]").yellow().bold(), message);
}

/// Print error message
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_has_valid_extension_ignores_case() {
        let exts = extensions();
        assert!(has_valid_extension("Jane_Doe.JPG", &exts));
        assert!(has_valid_extension("photos/bob.WebP", &exts));
        assert!(has_valid_extension("x.jpeg", &exts));
        assert!(!has_valid_extension("notes.txt", &exts));
        assert!(!has_valid_extension("README", &exts));
        assert!(!has_valid_extension(".png/", &exts));
    }

    #[test]
    fn test_entry_basename() {
        assert_eq!(entry_basename("Jane_Doe.jpg"), "Jane_Doe.jpg");
        assert_eq!(entry_basename("team/2024/Jane_Doe.jpg"), "Jane_Doe.jpg");
        assert_eq!(entry_basename("team\\Jane_Doe.jpg"), "Jane_Doe.jpg");
    }

    #[test]
    fn test_derive_name_from_filename() {
        assert_eq!(derive_name_from_filename("Jane_Doe.jpg"), "Jane Doe");
        assert_eq!(derive_name_from_filename("mary--jane__watson.png"), "mary jane watson");
        assert_eq!(derive_name_from_filename("Jos%C3%A9%20Garc%C3%ADa.jpeg"), "José García");
        assert_eq!(derive_name_from_filename("_Madonna_.webp"), "Madonna");
        assert_eq!(derive_name_from_filename("staff/Bob_Smith.png"), "Bob Smith");
    }

    #[test]
    fn test_derive_name_keeps_invalid_percent_encoding() {
        assert_eq!(derive_name_from_filename("100%_Real.jpg"), "100% Real");
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(output_filename("Jane Doe"), "Jane_Doe.png");
        assert_eq!(output_filename("Madonna"), "Madonna.png");
        assert_eq!(output_filename("AC/DC"), "AC_DC.png");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a:b*c?d"), "a_b_c_d");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
        assert_eq!(sanitize_filename("José"), "José");
    }
}
