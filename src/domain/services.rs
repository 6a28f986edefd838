use crate::domain::model::NamingStrategy;

pub const FALLBACK_FILE_NAME: &str = "upscaled_image.png";
pub const SOURCE_PREFIX: &str = "upscaled_";

const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".webp"];

/// Last path segment of `url` with the query string removed, forced to an image extension.
pub fn derive_file_name(url: &str, fallback: &str) -> String {
    let without_query = url.split('?').next().unwrap_or_default();
    let without_fragment = without_query.split('#').next().unwrap_or_default();
    // 反斜線也視為分隔符，名稱不可跳出輸出目錄
    let base = without_fragment
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let mut name = if base.is_empty() {
        fallback.to_string()
    } else {
        base.to_string()
    };

    let lower = name.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        name.push_str(".png");
    }
    name
}

pub fn output_file_name(strategy: NamingStrategy, source_url: &str, result_url: &str) -> String {
    match strategy {
        NamingStrategy::Generated => derive_file_name(result_url, FALLBACK_FILE_NAME),
        NamingStrategy::Source => format!(
            "{}{}",
            SOURCE_PREFIX,
            derive_file_name(source_url, FALLBACK_FILE_NAME)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_is_stripped() {
        assert_eq!(
            derive_file_name("https://cdn.example.com/out/result.jpg?token=abc", FALLBACK_FILE_NAME),
            "result.jpg"
        );
    }

    #[test]
    fn test_missing_extension_gets_png() {
        assert_eq!(
            derive_file_name("https://cdn.example.com/out/12345", FALLBACK_FILE_NAME),
            "12345.png"
        );
        assert_eq!(
            derive_file_name("https://cdn.example.com/photo.gif", FALLBACK_FILE_NAME),
            "photo.gif.png"
        );
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert_eq!(
            derive_file_name("https://cdn.example.com/PHOTO.WEBP", FALLBACK_FILE_NAME),
            "PHOTO.WEBP"
        );
    }

    #[test]
    fn test_trailing_slash_uses_fallback() {
        assert_eq!(
            derive_file_name("https://cdn.example.com/images/", FALLBACK_FILE_NAME),
            FALLBACK_FILE_NAME
        );
        assert_eq!(derive_file_name("", FALLBACK_FILE_NAME), FALLBACK_FILE_NAME);
    }

    #[test]
    fn test_backslash_segments_cannot_escape_output_dir() {
        let name = derive_file_name(
            "https://cdn.example.com/out/..\\..\\evil.png",
            FALLBACK_FILE_NAME,
        );
        assert_eq!(name, "evil.png");
        assert!(!name.contains(['/', '\\']));

        assert_eq!(
            derive_file_name("https://cdn.example.com/out/dir\\", FALLBACK_FILE_NAME),
            FALLBACK_FILE_NAME
        );
    }

    #[test]
    fn test_output_file_name_strategies() {
        let source = "https://example.com/photos/dog.jpeg?w=200";
        let result = "https://cdn.example.com/tasks/xyz/output.png";

        assert_eq!(
            output_file_name(NamingStrategy::Generated, source, result),
            "output.png"
        );
        assert_eq!(
            output_file_name(NamingStrategy::Source, source, result),
            "upscaled_dog.jpeg"
        );
    }
}
