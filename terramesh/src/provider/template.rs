//! URL templates for tiled raster sources.
//!
//! Supported placeholders:
//!
//! - `{x}`, `{y}`, `{z}`: tile column, row and zoom
//! - `{-y}`: row in TMS convention (`2^z - 1 - y`)
//!
//! A template may hold several alternatives (e.g. mirrored hosts). Each tile
//! deterministically picks entry `(x + y) mod len`.

use std::fmt;
use std::str::FromStr;

use crate::coord::TileCoord;

use super::types::ProviderError;

/// Separator between alternatives in the serialized form.
pub const TEMPLATE_SEPARATOR: char = ';';

/// One or more URL templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlTemplate {
    templates: Vec<String>,
}

impl UrlTemplate {
    /// Create a single-entry template.
    pub fn new(template: impl Into<String>) -> Result<Self, ProviderError> {
        Self::from_list(vec![template.into()])
    }

    /// Create a template from alternatives.
    ///
    /// Fails if the list is empty or any entry is blank.
    pub fn from_list(templates: Vec<String>) -> Result<Self, ProviderError> {
        if templates.is_empty() {
            return Err(ProviderError::InvalidTemplate(
                "at least one template is required".to_string(),
            ));
        }
        if templates.iter().any(|t| t.trim().is_empty()) {
            return Err(ProviderError::InvalidTemplate(
                "templates must not be blank".to_string(),
            ));
        }
        Ok(Self { templates })
    }

    /// Alternatives in declaration order.
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Substitute the tile into the template chosen for it.
    pub fn url_for(&self, tile: &TileCoord) -> String {
        let index = (u64::from(tile.x) + u64::from(tile.y)) % self.templates.len() as u64;
        self.templates[index as usize]
            .replace("{x}", &tile.x.to_string())
            .replace("{-y}", &tile.tms_y().to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{z}", &tile.z.to_string())
    }

    /// Serialized form used for update triggers (alternatives joined by `;`).
    pub fn to_trigger_string(&self) -> String {
        self.templates.join(&TEMPLATE_SEPARATOR.to_string())
    }
}

impl FromStr for UrlTemplate {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_list(
            s.split(TEMPLATE_SEPARATOR)
                .map(|t| t.trim().to_string())
                .collect(),
        )
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_trigger_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_xyz() {
        let template =
            UrlTemplate::new("https://elevation.example.com/terrarium/{z}/{x}/{y}.png").unwrap();
        let url = template.url_for(&TileCoord::new(263, 182, 9));
        assert_eq!(url, "https://elevation.example.com/terrarium/9/263/182.png");
    }

    #[test]
    fn test_substitutes_tms_row() {
        let template = UrlTemplate::new("https://t.example.com/{z}/{x}/{-y}.png").unwrap();
        let url = template.url_for(&TileCoord::new(1, 0, 2));
        assert_eq!(url, "https://t.example.com/2/1/3.png");
    }

    #[test]
    fn test_alternatives_picked_by_tile() {
        let template: UrlTemplate = "https://a.example.com/{z}/{x}/{y}.png;https://b.example.com/{z}/{x}/{y}.png"
            .parse()
            .unwrap();
        assert_eq!(
            template.url_for(&TileCoord::new(2, 2, 3)),
            "https://a.example.com/3/2/2.png"
        );
        assert_eq!(
            template.url_for(&TileCoord::new(2, 3, 3)),
            "https://b.example.com/3/2/3.png"
        );
    }

    #[test]
    fn test_trigger_string_joins_alternatives() {
        let template = UrlTemplate::from_list(vec!["a/{z}".to_string(), "b/{z}".to_string()]).unwrap();
        assert_eq!(template.to_trigger_string(), "a/{z};b/{z}");
        assert_eq!(template.to_string(), "a/{z};b/{z}");
    }

    #[test]
    fn test_rejects_empty() {
        assert!(UrlTemplate::from_list(Vec::new()).is_err());
        assert!("".parse::<UrlTemplate>().is_err());
        assert!("a/{z};  ".parse::<UrlTemplate>().is_err());
    }
}
