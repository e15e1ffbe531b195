//! Shared page chrome and HTML helpers

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap `body` in the wizard layout
pub fn page(title: &str, subtitle: &str, body: &str) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = env!("GIT_HASH");
    let build_timestamp = env!("BUILD_TIMESTAMP");
    let build_profile = env!("BUILD_PROFILE");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>recmerge - {title}</title>
    <link rel="stylesheet" href="/static/recmerge.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div>
                <h1>{title}</h1>
                <div class="subtitle">{subtitle}</div>
            </div>
            <div class="header-right">
                <div>recmerge-web v{version}</div>
                <div>{git_hash} ({build_profile})</div>
                <div>{build_timestamp}</div>
            </div>
        </div>
    </header>
    <div class="container">
{body}
    </div>
</body>
</html>
"#,
        title = escape_html(title),
        subtitle = escape_html(subtitle),
        body = body,
        version = version,
        git_hash = git_hash,
        build_profile = build_profile,
        build_timestamp = build_timestamp,
    )
}
