//! Character profile parser
//!
//! The active job is only shown as an icon inside
//! `.character__class_icon`; its image path identifies the job.

use crate::extract::{selector, ExtractError};
use crate::model::Category;
use scraper::{Html, Selector};
use url::Url;

pub(crate) struct ProfileSelectors {
    class_icon: Selector,
}

impl ProfileSelectors {
    pub(crate) fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            class_icon: selector(".character__class_icon img")?,
        })
    }
}

/// Finds the job icon on a profile page and maps it to a [`Category`]
pub(crate) fn parse_category(
    html: &str,
    selectors: &ProfileSelectors,
) -> Result<Category, ExtractError> {
    let document = Html::parse_document(html);

    let src = document
        .select(&selectors.class_icon)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or(ExtractError::MissingField { field: "class_icon" })?;

    let path = icon_path(src);
    Category::from_icon_path(&path).ok_or(ExtractError::UnknownIcon(path))
}

/// Path component of the icon source, without host or query string
fn icon_path(src: &str) -> String {
    match Url::parse(src) {
        Ok(url) => url.path().to_string(),
        Err(_) => src.split(['?', '#']).next().unwrap_or(src).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Result<Category, ExtractError> {
        parse_category(html, &ProfileSelectors::new().unwrap())
    }

    #[test]
    fn test_known_icon() {
        let html = r#"<div class="character__class_icon">
            <img src="https://img.finalfantasyxiv.com/h/7/i20QvSPcSQTybykLZDbQCgPwMw.png?1234"/>
        </div>"#;
        assert_eq!(parse(html), Ok(Category::Whm));
    }

    #[test]
    fn test_relative_icon() {
        let html = r#"<div class="character__class_icon">
            <img src="/h/C/WojNTqMJ_Ye1twvkIhw825zc20.png"/>
        </div>"#;
        assert_eq!(parse(html), Ok(Category::Vpr));
    }

    #[test]
    fn test_unknown_icon() {
        let html = r#"<div class="character__class_icon"><img src="https://img.finalfantasyxiv.com/h/z/zzz.png"/></div>"#;
        assert_eq!(
            parse(html),
            Err(ExtractError::UnknownIcon("/h/z/zzz.png".to_string()))
        );
    }

    #[test]
    fn test_missing_icon() {
        assert_eq!(
            parse("<html><body></body></html>"),
            Err(ExtractError::MissingField { field: "class_icon" })
        );
    }
}
