//! Specifier to URL resolution

use crate::error::SpecifierError;
use url::Url;

/// Resolve `specifier` against the URL of the module importing it
///
/// Relative and bare specifiers are joined onto `referrer`; absolute URLs
/// are taken as they are. The result must use one of `schemes`.
///
/// # Arguments
/// * `referrer` - URL of the importing module, or the loader's base URL
/// * `specifier` - Specifier as written in the import
/// * `schemes` - Accepted URL schemes
pub fn resolve_specifier(
    referrer: &Url,
    specifier: &str,
    schemes: &[String],
) -> Result<Url, SpecifierError> {
    let url = referrer
        .join(specifier)
        .map_err(|source| SpecifierError::Invalid {
            specifier: specifier.to_string(),
            referrer: referrer.to_string(),
            source,
        })?;

    if !schemes.iter().any(|scheme| scheme == url.scheme()) {
        return Err(SpecifierError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
            url: url.to_string(),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schemes() -> Vec<String> {
        vec!["file".to_string(), "memory".to_string()]
    }

    fn resolve(referrer: &str, specifier: &str) -> Result<Url, SpecifierError> {
        resolve_specifier(&Url::parse(referrer).unwrap(), specifier, &schemes())
    }

    #[test]
    fn test_relative_specifiers() {
        assert_eq!(
            resolve("memory:///lib/main", "./util").unwrap().as_str(),
            "memory:///lib/util"
        );
        assert_eq!(
            resolve("memory:///lib/main", "../top").unwrap().as_str(),
            "memory:///top"
        );
        assert_eq!(
            resolve("file:///project/", "./a.js").unwrap().as_str(),
            "file:///project/a.js"
        );
    }

    #[test]
    fn test_bare_specifier_joins_referrer_directory() {
        assert_eq!(
            resolve("memory:///lib/main", "helpers").unwrap().as_str(),
            "memory:///lib/helpers"
        );
    }

    #[test]
    fn test_absolute_url_kept() {
        assert_eq!(
            resolve("file:///project/", "memory:///shared").unwrap().as_str(),
            "memory:///shared"
        );
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = resolve("file:///project/", "https://example.com/a.js").unwrap_err();
        assert_eq!(
            err,
            SpecifierError::UnsupportedScheme {
                scheme: "https".to_string(),
                url: "https://example.com/a.js".to_string(),
            }
        );
    }
}
