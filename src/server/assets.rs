//! Static asset constants (CSS and JavaScript).

/// Stylesheet for the web interface.
pub const CSS: &str = include_str!("styles.css");

/// Page logic: catalog selection, batch polling and the file explorer.
pub const JS: &str = include_str!("script.js");
