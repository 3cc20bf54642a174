use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// CSS selectors for the fields of a recognized login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub username_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
}

/// Selectors configured for a specific host. They take precedence over detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelectors {
    pub username: Option<String>,
    pub password: Option<String>,
    pub login_button: Option<String>,
}

/// Find the login form on a page.
///
/// With configured selectors, the page is a login form only if every
/// configured selector matches an element. Without them, the first form that
/// holds a password input, a username-like input and a submit control wins.
pub fn find_login_form(html: &str, configured: Option<&FieldSelectors>) -> Option<LoginForm> {
    let document = Html::parse_document(html);

    if let Some(fields) = configured {
        if let Some(form) = from_configured(&document, fields) {
            return Some(form);
        }
        debug!("configured selectors did not match, falling back to detection");
    }

    detect(&document)
}

fn from_configured(document: &Html, fields: &FieldSelectors) -> Option<LoginForm> {
    let username = fields.username.as_deref()?;
    let password = fields.password.as_deref()?;
    let button = fields.login_button.as_deref()?;

    for sel in [username, password, button] {
        if !matches_any(document, sel) {
            debug!(selector = sel, "configured selector not found on page");
            return None;
        }
    }

    Some(LoginForm {
        username_selector: username.to_string(),
        password_selector: password.to_string(),
        submit_selector: button.to_string(),
    })
}

fn detect(document: &Html) -> Option<LoginForm> {
    let form_sel = selector("form")?;
    let input_sel = selector("input")?;

    for form in document.select(&form_sel) {
        let form_selector = form_selector(&form);
        let inputs: Vec<ElementRef> = form.select(&input_sel).collect();

        let Some(password) = inputs
            .iter()
            .find(|i| i.value().attr("type") == Some("password"))
        else {
            continue;
        };

        let text_inputs: Vec<&ElementRef> = inputs
            .iter()
            .filter(|i| matches!(i.value().attr("type").unwrap_or("text"), "text" | "email"))
            .collect();
        let username = text_inputs
            .iter()
            .find(|i| looks_like_username(i))
            .or_else(|| text_inputs.first());
        let Some(username) = username else {
            continue;
        };

        let Some(submit) = find_submit(&form, &form_selector) else {
            continue;
        };

        let login = LoginForm {
            username_selector: element_selector(username, &form_selector),
            password_selector: element_selector(password, &form_selector),
            submit_selector: submit,
        };
        let built = [&login.username_selector, &login.password_selector, &login.submit_selector];
        if let Some(bad) = built.into_iter().find(|s| selector(s).is_none()) {
            debug!(selector = %bad, "skipping form with unusable selector");
            continue;
        }
        debug!(?login, "detected login form");
        return Some(login);
    }

    None
}

fn looks_like_username(input: &ElementRef) -> bool {
    let attrs = [input.value().attr("name"), input.value().attr("id")];
    attrs.iter().flatten().any(|a| {
        let a = a.to_lowercase();
        a.contains("user") || a.contains("login") || a.contains("email") || a == "name"
    })
}

fn find_submit(form: &ElementRef, form_selector: &str) -> Option<String> {
    for candidate in ["input[type='submit']", "button[type='submit']", "button"] {
        let sel = selector(candidate)?;
        if let Some(elem) = form.select(&sel).next() {
            if elem.value().name() == "button"
                && !matches!(elem.value().attr("type"), None | Some("submit"))
            {
                continue;
            }
            return Some(element_selector(&elem, form_selector));
        }
    }
    None
}

fn form_selector(form: &ElementRef) -> String {
    if let Some(id) = form.value().attr("id") {
        return id_selector("form", id);
    }
    if let Some(name) = form.value().attr("name") {
        return format!("form[name={}]", quoted(name));
    }
    "form".to_string()
}

fn element_selector(element: &ElementRef, form_selector: &str) -> String {
    let tag = element.value().name();
    if let Some(id) = element.value().attr("id") {
        return id_selector(tag, id);
    }
    if let Some(name) = element.value().attr("name") {
        return format!("{}[name={}]", tag, quoted(name));
    }

    match element.value().attr("type") {
        Some(t) => format!("{} {}[type={}]", form_selector, tag, quoted(t)),
        None => format!("{} {}", form_selector, tag),
    }
}

/// `#id` for plain identifiers, a quoted attribute match otherwise
/// (`loginForm:username`, `user.name`, ids starting with a digit)
fn id_selector(tag: &str, id: &str) -> String {
    let mut chars = id.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        format!("#{}", id)
    } else {
        format!("{}[id={}]", tag, quoted(id))
    }
}

/// CSS string literal for an attribute value
fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            // newlines need a hex escape inside CSS strings
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn matches_any(document: &Html, sel: &str) -> bool {
    selector(sel)
        .map(|s| document.select(&s).next().is_some())
        .unwrap_or(false)
}

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}
