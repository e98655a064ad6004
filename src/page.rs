use std::fmt::Display;

const ERROR_PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<style>
body {
  background-color: lightgray;
}

p {
  font-size: 48px;
}

p.error {
    color: red;
}
</style>
</head>
<body>
<p class="error">Oh no, an error happened!</p>
"#;

/// Fixed-style page shown in place of a document that failed to load.
pub fn error_page(error: &dyn Display) -> String {
    let mut page = String::from(ERROR_PAGE_HEAD);
    page.push_str("<p>");
    page.push_str(&escape_html(&error.to_string()));
    page.push_str("</p>\n</body>\n</html>\n");
    page
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
