//! Askama template structs for the web interface.

use askama::Template;

/// Main page.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    pub default_path: &'a str,
    pub version: &'a str,
}
