//! The API documentation page.

use serde_json::Value;

const TEMPLATE: &str = include_str!("../../../templates/swagger_ui.html");

/// Render the Swagger UI page with `document` inlined.
pub(crate) fn swagger_ui_page_content(document: &Value) -> Result<Vec<u8>, serde_json::Error> {
    // `</script>` inside a string would end the inline script
    let spec = serde_json::to_string(document)?.replace("</", "<\\/");
    let title = document
        .pointer("/info/title")
        .and_then(Value::as_str)
        .map(escape_html)
        .unwrap_or_else(|| "API documentation".to_string());
    Ok(TEMPLATE
        .replace("{{TITLE}}", &title)
        .replace("{{SPEC}}", &spec)
        .into_bytes())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
