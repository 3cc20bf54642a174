pub mod login_form;

use scraper::{Html, Selector};

pub use login_form::{find_login_form, FieldSelectors, LoginForm};

/// Page `<title>`, trimmed
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("title").ok()?;
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_title() {
        assert_eq!(
            page_title("<html><head><title> Login here </title></head></html>").as_deref(),
            Some("Login here")
        );
        assert!(page_title("<p>none</p>").is_none());
    }
}
