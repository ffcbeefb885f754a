//! Render a [`Document`] back to feature-file text.
//!
//! Reparsing the output yields the same tree apart from line numbers.
//! Comments are emitted at the top of the file because their positions are
//! not tied to elements. When that block could be read as a language
//! directive, the document's own directive is written above it.

use crate::ast::{
    Background, DataTable, DocString, Document, Examples, Feature, FeatureChild, Rule, RuleChild,
    Scenario, Step, TableRow, Tag,
};
use crate::parser::language_directive;
use crate::table::{escape_cell, escape_doc_line};

const INDENT: &str = "  ";

struct Renderer {
    out: String,
}

impl Renderer {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn tags(&mut self, depth: usize, tags: &[Tag]) {
        if tags.is_empty() {
            return;
        }
        let names: Vec<&str> = tags.iter().map(|tag| tag.name.as_str()).collect();
        self.line(depth, &names.join(" "));
    }

    fn header(&mut self, depth: usize, keyword: &str, name: &str, description: &str) {
        if name.is_empty() {
            self.line(depth, &format!("{keyword}:"));
        } else {
            self.line(depth, &format!("{keyword}: {name}"));
        }
        for text in description.lines() {
            self.line(depth + 1, text);
        }
    }

    fn feature(&mut self, feature: &Feature) {
        self.tags(0, &feature.tags);
        self.header(0, &feature.keyword, &feature.name, &feature.description);
        for child in &feature.children {
            self.out.push('\n');
            match child {
                FeatureChild::Background(background) => self.background(1, background),
                FeatureChild::Rule(rule) => self.rule(rule),
                FeatureChild::Scenario(scenario) => self.scenario(1, scenario),
            }
        }
    }

    fn rule(&mut self, rule: &Rule) {
        self.tags(1, &rule.tags);
        self.header(1, &rule.keyword, &rule.name, &rule.description);
        for child in &rule.children {
            self.out.push('\n');
            match child {
                RuleChild::Background(background) => self.background(2, background),
                RuleChild::Scenario(scenario) => self.scenario(2, scenario),
            }
        }
    }

    fn background(&mut self, depth: usize, background: &Background) {
        self.header(
            depth,
            &background.keyword,
            &background.name,
            &background.description,
        );
        for step in &background.steps {
            self.step(depth + 1, step);
        }
    }

    fn scenario(&mut self, depth: usize, scenario: &Scenario) {
        self.tags(depth, &scenario.tags);
        self.header(depth, &scenario.keyword, &scenario.name, &scenario.description);
        for step in &scenario.steps {
            self.step(depth + 1, step);
        }
        for examples in &scenario.examples {
            self.out.push('\n');
            self.examples(depth + 1, examples);
        }
    }

    fn step(&mut self, depth: usize, step: &Step) {
        let separator = if step.keyword.ends_with('\'') { "" } else { " " };
        self.line(depth, &format!("{}{separator}{}", step.keyword, step.text));
        if let Some(table) = &step.table {
            self.table(depth + 1, table);
        }
        if let Some(doc_string) = &step.doc_string {
            self.doc_string(depth + 1, doc_string);
        }
    }

    fn table(&mut self, depth: usize, table: &DataTable) {
        for row in &table.rows {
            self.row(depth, row);
        }
    }

    fn row(&mut self, depth: usize, row: &TableRow) {
        let mut text = String::from("|");
        for cell in &row.cells {
            text.push(' ');
            text.push_str(&escape_cell(cell));
            text.push_str(" |");
        }
        self.line(depth, &text);
    }

    fn doc_string(&mut self, depth: usize, doc_string: &DocString) {
        let delimiter = doc_string.delimiter.as_str();
        let media_type = doc_string.media_type.as_deref().unwrap_or_default();
        self.line(depth, &format!("{delimiter}{media_type}"));
        if !doc_string.content.is_empty() {
            for text in doc_string.content.split('\n') {
                if text.is_empty() {
                    self.out.push('\n');
                } else {
                    self.line(depth, &escape_doc_line(text, doc_string.delimiter));
                }
            }
        }
        self.line(depth, delimiter);
    }

    fn examples(&mut self, depth: usize, examples: &Examples) {
        self.tags(depth, &examples.tags);
        self.header(depth, &examples.keyword, &examples.name, &examples.description);
        if let Some(header) = &examples.header {
            self.row(depth + 1, header);
        }
        for row in &examples.body {
            self.row(depth + 1, row);
        }
    }
}

/// Render `document` as feature-file text.
///
/// A `# language:` directive heads the output for non-English documents
/// and for documents with a comment that reads like a directive, so the
/// reparse keeps the original dialect.
///
/// # Examples
/// ```
/// use bddkit_gherkin::{parse, render_document};
///
/// let parsed = parse("Feature: Login\n  Scenario: ok\n    Given a user\n").expect("parses");
/// let text = render_document(&parsed.document);
/// assert!(text.contains("Given a user"));
/// ```
#[must_use]
pub fn render_document(document: &Document) -> String {
    let mut renderer = Renderer { out: String::new() };
    let lookalike = document
        .comments
        .iter()
        .any(|comment| language_directive(&comment.text).is_some());
    if lookalike || document.language != "en" {
        renderer.line(0, &format!("# language: {}", document.language));
    }
    for comment in &document.comments {
        renderer.line(0, &comment.text);
    }
    if let Some(feature) = &document.feature {
        renderer.feature(feature);
    }
    renderer.out
}
