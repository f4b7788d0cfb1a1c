//! Database host field computation

use crate::config::DbDialect;

/// Build the value typed into the installer's database host field.
///
/// An unbracketed host with more than one colon is taken to be an IPv6
/// literal. MySQL drivers need it bracketed even without a port; the
/// PostgreSQL driver only needs brackets when a port follows. A blank port
/// counts as no port.
pub fn build(host: &str, port: Option<&str>, dialect: DbDialect) -> String {
    let port = port.map(str::trim).filter(|p| !p.is_empty());

    let mut connection = host.to_string();
    if looks_like_ipv6(host) && (port.is_some() || !dialect.accepts_bare_ipv6()) {
        connection = format!("[{}]", connection);
    }
    if let Some(port) = port {
        connection.push(':');
        connection.push_str(port);
    }
    connection
}

fn looks_like_ipv6(host: &str) -> bool {
    host.split(':').count() > 2 && !host.contains('[')
}
