/// Documentation comment text attached to a declaration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Doc {
    fragments: Vec<String>,
}

impl Doc {
    pub fn new() -> Self {
        Doc {
            fragments: Vec::new(),
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.fragments.push(text.into());
    }

    pub fn extend(&mut self, other: Doc) {
        self.fragments.extend(other.fragments);
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    /// Comment text with the gutter stripped: no `*` margins, no trailing
    /// whitespace, no leading or trailing blank lines, and runs of blank lines
    /// collapsed to one. Indentation past the gutter is kept.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for fragment in &self.fragments {
            for raw in fragment.lines() {
                let line = strip_gutter(raw).trim_end();
                if line.is_empty() && lines.last().map_or(true, String::is_empty) {
                    continue;
                }
                lines.push(line.to_owned());
            }
        }
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines
    }

    pub fn to_string(&self) -> String {
        let mut doc = String::new();
        for line in self.lines() {
            doc += &line;
            doc.push('\n');
        }
        doc
    }
}

fn strip_gutter(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('*') {
        Some(rest) if !rest.starts_with('/') => rest.strip_prefix(' ').unwrap_or(rest),
        _ => match line.strip_prefix(' ') {
            Some(rest) => rest,
            None => line,
        },
    }
}

/// Replaces each identifier-like word for which `rename` returns a new
/// spelling, leaving everything else untouched.
pub fn rename_words(line: &str, rename: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(line.len());
    let mut word_start = None;
    for (i, ch) in line.char_indices() {
        let is_word = ch == '_' || ch.is_ascii_alphanumeric();
        match (is_word, word_start) {
            (true, None) => word_start = Some(i),
            (false, Some(start)) => {
                push_word(&mut out, &line[start..i], rename);
                word_start = None;
                out.push(ch);
            }
            (false, None) => out.push(ch),
            (true, Some(_)) => {}
        }
    }
    if let Some(start) = word_start {
        push_word(&mut out, &line[start..], rename);
    }
    out
}

fn push_word(out: &mut String, word: &str, rename: &dyn Fn(&str) -> Option<String>) {
    match rename(word) {
        Some(renamed) => out.push_str(&renamed),
        None => out.push_str(word),
    }
}

#[cfg(test)]
mod tests {
    use super::{rename_words, Doc};

    #[test]
    fn test_block_gutter() {
        let mut doc = Doc::new();
        doc.push("\n * Create a window.\n *\n *\n * \\param title the title.\n ");
        assert_eq!(
            doc.lines(),
            ["Create a window.", "", "\\param title the title."],
        );
    }

    #[test]
    fn test_line_comments_keep_indent() {
        let mut doc = Doc::new();
        doc.push(" Example:");
        doc.push("     code();");
        assert_eq!(doc.lines(), ["Example:", "    code();"]);
    }

    #[test]
    fn test_rename_words() {
        let renamed = rename_words("Use SDL_CreateWindow() first.", &|word| {
            (word == "SDL_CreateWindow").then(|| "CreateWindow".to_owned())
        });
        assert_eq!(renamed, "Use CreateWindow() first.");
    }
}
