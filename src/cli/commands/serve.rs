//! Web server command.

use console::style;

use model_manager::config::Settings;

/// Default port when the bind address names only a host.
const DEFAULT_PORT: u16 = 9999;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    let downloader = settings.downloader();
    if downloader.is_available() {
        println!(
            "  {} Using downloader: {}",
            style("✓").green(),
            downloader.program()
        );
    } else {
        eprintln!(
            "  {} Downloader '{}' not found, downloads will fail",
            style("!").yellow(),
            downloader.program()
        );
    }

    println!(
        "{} Catalog: {}",
        style("→").cyan(),
        style(&settings.catalog_url).dim()
    );
    println!(
        "{} Default base path: {}",
        style("→").cyan(),
        settings.base_path.display()
    );
    println!(
        "{} Starting Model Manager at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    model_manager::server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "9999" -> 127.0.0.1:9999
/// - Just a host: "0.0.0.0" -> 0.0.0.0:9999
/// - Host and port: "0.0.0.0:9999" -> 0.0.0.0:9999
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(
            parse_bind_address("8080").unwrap(),
            ("127.0.0.1".to_string(), 8080)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 9999)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0:9999").unwrap(),
            ("0.0.0.0".to_string(), 9999)
        );
        assert!(parse_bind_address("  ").is_err());
    }
}
