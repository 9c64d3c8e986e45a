use scraper::{Html, Node};

/// Flatten a job description for the terminal.
///
/// Descriptions come either as plain text or as an HTML fragment straight
/// from the job board. Plain text passes through untouched; markup keeps its
/// text and paragraph/list structure, with list items rendered as bullets.
pub fn plain_text(description: &str) -> String {
    if !looks_like_markup(description) {
        return description.trim().to_string();
    }

    let fragment = Html::parse_fragment(description);
    let mut raw = String::new();
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(element) => match element.name() {
                "li" => raw.push_str("\n• "),
                "br" | "p" | "div" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    raw.push('\n')
                }
                _ => {}
            },
            _ => {}
        }
    }
    tidy(&raw)
}

fn looks_like_markup(text: &str) -> bool {
    text.contains('<') && text.contains('>')
}

/// Collapse whitespace inside lines and keep at most one blank line in a row.
fn tidy(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
