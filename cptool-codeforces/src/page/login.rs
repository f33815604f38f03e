use anyhow::Context as _;
use cptool_util::select;

use crate::page::hidden_fields;
use crate::service::scrape::Scrape as _;
use crate::service::{Document, Form, Url};
use crate::Result;

/// Credential form of the `/enter` page. "Remember me" is always ticked.
pub fn login_form(login_page: &Document, user: &str, pass: &str) -> Result<Form> {
    let mut form = hidden_fields(&login_page.html()).context("Could not read login page")?;
    form.extend(vec![
        ("action".to_owned(), "enter".to_owned()),
        ("handleOrEmail".to_owned(), user.to_owned()),
        ("password".to_owned(), pass.to_owned()),
        ("remember".to_owned(), "on".to_owned()),
    ]);
    Ok(form)
}

pub fn logout_url(page: &Document) -> Result<Url> {
    let href = page
        .html()
        .attr_of(select!(r#"#header a[href*="/logout"]"#), "href")
        .context("Could not find logout link")?;
    page.url()
        .join(&href)
        .context("Could not parse logout url")
}
