use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset path must be relative to the asset root")]
    LeadingSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Texture keys name spritesheets registered on the scene world, for example
/// `tilemap_sheet` or `kenny-particles`.
pub(crate) fn validate_texture_key(key: &str) -> Result<(), AssetKeyError> {
    validate(key, false)
}

/// Image paths are relative to the asset root and may carry a file extension.
pub(crate) fn validate_asset_path(path: &str) -> Result<(), AssetKeyError> {
    validate(path, true)
}

fn validate(key: &str, allow_dot: bool) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(AssetKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-') {
            continue;
        }
        if allow_dot && ch == '.' {
            continue;
        }
        return Err(AssetKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_texture_keys() {
        for key in ["tilemap_sheet", "platformer_characters", "kenny-particles"] {
            assert!(validate_texture_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_invalid_texture_keys() {
        for key in ["", "/a", "..", "a/../b", r"a\b", "A", "a.png"] {
            assert!(validate_texture_key(key).is_err(), "key={key}");
        }
    }

    #[test]
    fn asset_paths_allow_extensions_but_not_traversal() {
        assert!(validate_asset_path("tilemap_packed.png").is_ok());
        assert!(validate_asset_path("levels/platformer-level-1.tmj").is_ok());
        assert_eq!(
            validate_asset_path("../secret.png"),
            Err(AssetKeyError::ParentTraversal)
        );
        assert_eq!(
            validate_asset_path("/etc/passwd"),
            Err(AssetKeyError::LeadingSlash)
        );
    }
}
