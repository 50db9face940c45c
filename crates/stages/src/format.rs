//! Markdown and HTML renderings of a story

fn paragraphs(story: &str) -> impl Iterator<Item = &str> {
    story.split("\n\n").map(str::trim)
}

pub fn format_markdown(story: &str, title: &str) -> String {
    let mut lines = vec![format!("# {title}\n")];
    for para in paragraphs(story) {
        lines.push(para.to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn format_html(story: &str, title: &str) -> String {
    let mut html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <style>
        body {{
            font-family: Georgia, serif;
            max-width: 800px;
            margin: 0 auto;
            padding: 20px;
            line-height: 1.6;
        }}
        h1 {{
            color: #333;
            border-bottom: 2px solid #333;
            padding-bottom: 10px;
        }}
        p {{
            margin-bottom: 15px;
        }}
    </style>
</head>
<body>
    <h1>{title}</h1>
"#
    );

    for para in paragraphs(story) {
        html.push_str(&format!("    <p>{para}</p>\n"));
    }
    html.push_str("</body>\n</html>");
    html
}
