use crate::utils::error::{EtlError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 檔名或壓縮檔項目名稱中不可出現的字元：路徑分隔符、引號與控制字元
pub fn has_unsafe_name_chars(name: &str) -> bool {
    name.contains(['/', '\\', '"']) || name.chars().any(char::is_control)
}

/// 壓縮檔名稱會直接放進 Content-Disposition，不允許路徑分隔符與引號
pub fn validate_archive_filename(field_name: &str, filename: &str) -> Result<()> {
    validate_non_empty_string(field_name, filename)?;

    if has_unsafe_name_chars(filename) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: filename.to_string(),
            reason: "Filename must not contain path separators, quotes or control characters"
                .to_string(),
        });
    }

    if !filename.ends_with(".zip") {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: filename.to_string(),
            reason: "Archive filename must end with .zip".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("endpoint", "https://example.com").is_ok());
        assert!(validate_url("endpoint", "http://example.com").is_ok());
        assert!(validate_url("endpoint", "").is_err());
        assert!(validate_url("endpoint", "invalid-url").is_err());
        assert!(validate_url("endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("cache.capacity", 5, 1).is_ok());
        assert!(validate_positive_number("cache.capacity", 0, 1).is_err());
    }

    #[test]
    fn test_validate_archive_filename() {
        assert!(validate_archive_filename("server.archive_filename", "scenario.zip").is_ok());
        assert!(validate_archive_filename("server.archive_filename", "../scenario.zip").is_err());
        assert!(validate_archive_filename("server.archive_filename", "a\"b.zip").is_err());
        assert!(validate_archive_filename("server.archive_filename", "scenario.tar").is_err());
        assert!(validate_archive_filename("server.archive_filename", "  ").is_err());
    }

    #[test]
    fn test_has_unsafe_name_chars() {
        assert!(!has_unsafe_name_chars("scenario_data"));
        assert!(has_unsafe_name_chars("a/b"));
        assert!(has_unsafe_name_chars("a\\b"));
        assert!(has_unsafe_name_chars("tab\tle"));
    }
}
