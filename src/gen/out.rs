use crate::gen::include::Includes;
use indexmap::IndexMap as Map;
use std::cell::RefCell;
use std::fmt::{self, Arguments, Write};

pub(crate) struct OutFile<'a> {
    pub banner: String,
    /// Source symbol to wrapper symbol, applied to doc comment text.
    pub renames: &'a Map<String, String>,
    /// Prefix that reaches a free wrapper function from inside a class.
    pub scope: String,
    pub include: Includes,
    content: RefCell<Content>,
}

#[derive(Default)]
pub struct Content {
    bytes: String,
    section_pending: bool,
    blocks_pending: Vec<String>,
}

impl<'a> OutFile<'a> {
    pub fn new(banner: String, renames: &'a Map<String, String>, scope: String) -> Self {
        OutFile {
            banner,
            renames,
            scope,
            include: Includes::new(),
            content: RefCell::new(Content::new()),
        }
    }

    // Write a blank line if the preceding section had any contents.
    pub fn next_section(&mut self) {
        self.content.get_mut().next_section();
    }

    pub fn begin_block(&mut self, block: &str) {
        self.content.get_mut().begin_block(block);
    }

    pub fn end_block(&mut self, block: &str) {
        self.content.get_mut().end_block(block);
    }

    pub fn write_fmt(&self, args: Arguments) {
        let content = &mut *self.content.borrow_mut();
        let _ = Write::write_fmt(content, args);
    }

    pub fn content(&self) -> String {
        let include = self.include.to_string();
        let content = &self.content.borrow().bytes;
        let len = self.banner.len() + include.len() + content.len() + 16;
        let mut out = String::with_capacity(len);
        out.push_str(&self.banner);
        out.push_str("\n#pragma once\n\n");
        out.push_str(&include);
        out.push_str(content);
        out
    }
}

impl Write for Content {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s);
        Ok(())
    }
}

impl Content {
    fn new() -> Self {
        Content::default()
    }

    pub fn next_section(&mut self) {
        self.section_pending = true;
    }

    pub fn begin_block(&mut self, block: &str) {
        self.blocks_pending.push(block.to_owned());
    }

    pub fn end_block(&mut self, block: &str) {
        if self.blocks_pending.pop().is_none() {
            self.bytes.push_str("\n} // ");
            self.bytes.push_str(block);
            self.bytes.push('\n');
            self.section_pending = true;
        }
    }

    fn write(&mut self, b: &str) {
        if !b.is_empty() {
            if !self.blocks_pending.is_empty() {
                if !self.bytes.is_empty() {
                    self.bytes.push('\n');
                }
                for block in self.blocks_pending.drain(..) {
                    self.bytes.push_str(&block);
                    self.bytes.push_str(" {\n\n");
                }
                self.section_pending = false;
            } else if self.section_pending {
                if !self.bytes.is_empty() {
                    self.bytes.push('\n');
                }
                self.section_pending = false;
            }
            self.bytes.push_str(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OutFile;
    use indexmap::IndexMap;

    #[test]
    fn test_empty_block_is_elided() {
        let renames = IndexMap::new();
        let mut out = OutFile::new("// banner".to_owned(), &renames, "::".to_owned());
        out.begin_block("namespace ns");
        out.end_block("namespace ns");
        assert_eq!(out.content(), "// banner\n#pragma once\n\n");
    }

    #[test]
    fn test_sections_are_separated() {
        let renames = IndexMap::new();
        let mut out = OutFile::new("// banner".to_owned(), &renames, "::".to_owned());
        out.begin_block("namespace ns");
        writeln!(out, "using A = int;");
        out.next_section();
        out.next_section();
        writeln!(out, "using B = int;");
        out.end_block("namespace ns");
        assert_eq!(
            out.content(),
            "// banner\n#pragma once\n\nnamespace ns {\n\nusing A = int;\n\nusing B = int;\n\n} // namespace ns\n",
        );
    }
}
