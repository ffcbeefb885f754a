//! Line-oriented feature-file parser.
//!
//! The parser walks the source top to bottom, keeping a cursor that records
//! which element the next free-text line, step, table row or doc string
//! belongs to. Anything that does not fit its position is skipped and
//! reported as a [`Diagnostic`]; only malformed tags abort parsing.

use crate::ast::{
    Background, Comment, DataTable, DocString, DocStringDelimiter, Document, Examples, Feature,
    FeatureChild, Rule, RuleChild, Scenario, ScenarioKind, Step, TableRow, Tag,
};
use crate::dialect::{HeaderMatch, KeywordMatcher, StepMatch, StructuralKeyword};
use crate::error::{Diagnostic, DiagnosticKind, ParseError};
use crate::table::{dedent, doc_string_delimiter, split_row, unescape_doc_line};

/// Which element the parser is currently filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Start,
    Ignored,
    Feature,
    Rule,
    Block,
    Step,
    Examples,
}

/// Borrow of the last background or scenario in the current scope.
enum Block<'a> {
    Background(&'a mut Background),
    Scenario(&'a mut Scenario),
}

struct OpenDocString {
    delimiter: DocStringDelimiter,
    indent: usize,
    media_type: Option<String>,
    lines: Vec<String>,
    line: usize,
    attach: bool,
}

pub(crate) struct LineParser {
    language: String,
    directive_line: Option<usize>,
    feature: Option<Feature>,
    comments: Vec<Comment>,
    diagnostics: Vec<Diagnostic>,
    pending_tags: Vec<Tag>,
    cursor: Cursor,
    in_rule: bool,
    description_open: bool,
    doc_string: Option<OpenDocString>,
}

/// Extract the dialect code from a `# language: xx` comment.
pub(crate) fn language_directive(comment: &str) -> Option<&str> {
    let code = comment
        .strip_prefix('#')?
        .trim_start()
        .strip_prefix("language")?
        .trim_start()
        .strip_prefix(':')?
        .trim();
    (!code.is_empty()).then_some(code)
}

/// Find a language directive among the leading comment lines.
pub(crate) fn detect_language(source: &str) -> Option<(&str, usize)> {
    source
        .lines()
        .enumerate()
        .map(|(idx, line)| (line.trim(), idx + 1))
        .filter(|(line, _)| !line.is_empty())
        .take_while(|(line, _)| line.starts_with('#'))
        .find_map(|(line, number)| language_directive(line).map(|code| (code, number)))
}

impl LineParser {
    pub(crate) fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            directive_line: None,
            feature: None,
            comments: Vec::new(),
            diagnostics: Vec::new(),
            pending_tags: Vec::new(),
            cursor: Cursor::Start,
            in_rule: false,
            description_open: false,
            doc_string: None,
        }
    }

    /// Line of the language directive that selected the dialect; it is
    /// not recorded as a comment.
    pub(crate) fn with_directive_line(mut self, line: usize) -> Self {
        self.directive_line = Some(line);
        self
    }

    pub(crate) fn push_diagnostic(
        &mut self,
        kind: DiagnosticKind,
        line: usize,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic::new(kind, line, message));
    }

    /// Parse every line of `source`.
    pub(crate) fn run(
        mut self,
        matcher: &KeywordMatcher,
        source: &str,
        source_name: Option<String>,
    ) -> Result<(Document, Vec<Diagnostic>), ParseError> {
        for (idx, raw) in source.lines().enumerate() {
            self.line(matcher, raw, idx + 1)?;
        }
        self.finish();
        let document = Document {
            feature: self.feature,
            comments: self.comments,
            source: source_name,
            language: self.language,
        };
        Ok((document, self.diagnostics))
    }

    fn line(&mut self, matcher: &KeywordMatcher, raw: &str, number: usize) -> Result<(), ParseError> {
        if self.doc_string.is_some() {
            self.doc_string_line(raw);
            return Ok(());
        }
        let line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }
        if line.starts_with('#') {
            if self.directive_line == Some(number) {
                return Ok(());
            }
            self.comments.push(Comment {
                text: line.to_string(),
                line: number,
            });
            return Ok(());
        }
        if line.starts_with('@') {
            return self.tag_line(line, number);
        }
        if line.starts_with('|') {
            self.table_row(line, number);
            return Ok(());
        }
        if let Some((delimiter, rest)) = doc_string_delimiter(line) {
            self.open_doc_string(raw, delimiter, rest, number);
            return Ok(());
        }
        if let Some(header) = matcher.header(line) {
            self.header(&header, number);
            return Ok(());
        }
        if let Some(step) = matcher.step(line) {
            match self.cursor {
                Cursor::Block | Cursor::Step => self.step(&step, number),
                Cursor::Ignored => {}
                Cursor::Start | Cursor::Feature | Cursor::Rule | Cursor::Examples => {
                    self.description_open = false;
                    self.push_diagnostic(
                        DiagnosticKind::StepOutsideScenario,
                        number,
                        "step appears outside a background or scenario",
                    );
                }
            }
            return Ok(());
        }
        self.free_text(line, number);
        Ok(())
    }

    fn finish(&mut self) {
        if let Some(open) = self.doc_string.take() {
            self.push_diagnostic(
                DiagnosticKind::UnterminatedDocString,
                open.line,
                "doc string is not closed before the end of the file",
            );
            self.close_doc_string(open);
        }
        self.discard_pending_tags("tags are not followed by a feature, rule, scenario or examples");
        if self.feature.is_none() {
            self.push_diagnostic(
                DiagnosticKind::MissingFeature,
                0,
                "document has no Feature",
            );
        }
    }

    fn discard_pending_tags(&mut self, reason: &str) {
        if let Some(first) = self.pending_tags.first() {
            let line = first.line;
            self.pending_tags.clear();
            self.push_diagnostic(DiagnosticKind::OrphanTags, line, reason);
        }
    }

    fn tag_line(&mut self, line: &str, number: usize) -> Result<(), ParseError> {
        let (tags, comment) = line
            .find(" #")
            .map_or((line, None), |idx| {
                let (tags, comment) = line.split_at(idx);
                (tags, Some(comment.trim()))
            });
        for token in tags.split_whitespace() {
            if token.len() <= 1 || !token.starts_with('@') {
                return Err(ParseError::MalformedTag {
                    line: number,
                    token: token.to_string(),
                });
            }
            self.pending_tags.push(Tag {
                name: token.to_string(),
                line: number,
            });
        }
        if let Some(comment) = comment {
            self.comments.push(Comment {
                text: comment.to_string(),
                line: number,
            });
        }
        Ok(())
    }

    fn header(&mut self, header: &HeaderMatch<'_>, number: usize) {
        self.description_open = true;
        if header.kind != StructuralKeyword::Feature && self.feature.is_none() {
            self.discard_pending_tags("tags before the feature header are ignored");
            self.push_diagnostic(
                DiagnosticKind::OutsideFeature,
                number,
                format!("`{}:` appears before any Feature", header.keyword),
            );
            self.cursor = Cursor::Ignored;
            return;
        }
        let keyword = header.keyword.to_string();
        let name = header.name.to_string();
        match header.kind {
            StructuralKeyword::Feature => self.open_feature(header, number),
            StructuralKeyword::Rule => {
                let tags = std::mem::take(&mut self.pending_tags);
                if let Some(feature) = self.feature.as_mut() {
                    feature.children.push(FeatureChild::Rule(Rule {
                        keyword,
                        name,
                        description: String::new(),
                        tags,
                        children: Vec::new(),
                        line: number,
                    }));
                }
                self.in_rule = true;
                self.cursor = Cursor::Rule;
            }
            StructuralKeyword::Background => {
                self.discard_pending_tags("backgrounds cannot carry tags");
                self.push_child(RuleChild::Background(Background {
                    keyword,
                    name,
                    description: String::new(),
                    steps: Vec::new(),
                    line: number,
                }));
                self.cursor = Cursor::Block;
            }
            StructuralKeyword::Scenario | StructuralKeyword::ScenarioOutline => {
                let kind = if header.kind == StructuralKeyword::Scenario {
                    ScenarioKind::Plain
                } else {
                    ScenarioKind::Outline
                };
                let tags = std::mem::take(&mut self.pending_tags);
                self.push_child(RuleChild::Scenario(Scenario {
                    keyword,
                    kind,
                    name,
                    description: String::new(),
                    tags,
                    steps: Vec::new(),
                    examples: Vec::new(),
                    line: number,
                }));
                self.cursor = Cursor::Block;
            }
            StructuralKeyword::Examples => self.open_examples(keyword, name, number),
        }
    }

    fn open_feature(&mut self, header: &HeaderMatch<'_>, number: usize) {
        if self.feature.is_some() {
            self.discard_pending_tags("tags on a duplicate feature are ignored");
            self.push_diagnostic(
                DiagnosticKind::DuplicateFeature,
                number,
                "only one Feature is allowed per document; this one is ignored",
            );
            self.cursor = Cursor::Ignored;
            self.description_open = false;
            return;
        }
        self.feature = Some(Feature {
            keyword: header.keyword.to_string(),
            name: header.name.to_string(),
            description: String::new(),
            tags: std::mem::take(&mut self.pending_tags),
            children: Vec::new(),
            line: number,
            language: self.language.clone(),
        });
        self.cursor = Cursor::Feature;
    }

    fn open_examples(&mut self, keyword: String, name: String, number: usize) {
        let tags = std::mem::take(&mut self.pending_tags);
        let Some(scenario) = self.last_scenario_mut() else {
            self.push_diagnostic(
                DiagnosticKind::ExamplesOutsideScenario,
                number,
                "Examples must follow a scenario outline",
            );
            self.cursor = Cursor::Ignored;
            self.description_open = false;
            return;
        };
        scenario.examples.push(Examples {
            keyword,
            name,
            description: String::new(),
            tags,
            header: None,
            body: Vec::new(),
            line: number,
        });
        self.cursor = Cursor::Examples;
    }

    fn step(&mut self, step: &StepMatch<'_>, number: usize) {
        self.discard_pending_tags("steps cannot carry tags");
        self.description_open = false;
        let new_step = Step {
            keyword: step.keyword.to_string(),
            role: step.role,
            text: step.text.to_string(),
            table: None,
            doc_string: None,
            line: number,
        };
        if let Some(steps) = self.steps_mut() {
            steps.push(new_step);
            self.cursor = Cursor::Step;
        } else {
            self.push_diagnostic(
                DiagnosticKind::StepOutsideScenario,
                number,
                "step appears outside a background or scenario",
            );
        }
    }

    fn table_row(&mut self, line: &str, number: usize) {
        self.description_open = false;
        let split = split_row(line);
        if !split.terminated {
            self.push_diagnostic(
                DiagnosticKind::UnterminatedTableRow,
                number,
                "table row does not end with '|'",
            );
        }
        let row = TableRow {
            cells: split.cells,
            line: number,
        };
        let expected = match self.cursor {
            Cursor::Examples => self.push_examples_row(row),
            Cursor::Step => self.push_step_row(row, number),
            _ => {
                self.push_diagnostic(
                    DiagnosticKind::TableOutsideStep,
                    number,
                    "table row appears outside a step or examples block",
                );
                None
            }
        };
        if let Some((expected, actual)) = expected.filter(|(expected, actual)| expected != actual) {
            self.push_diagnostic(
                DiagnosticKind::InconsistentTable,
                number,
                format!("table row has {actual} cells, expected {expected}"),
            );
        }
    }

    /// Returns the expected and actual cell counts.
    fn push_examples_row(&mut self, row: TableRow) -> Option<(usize, usize)> {
        let examples = self.last_scenario_mut()?.examples.last_mut()?;
        let actual = row.cells.len();
        match &examples.header {
            Some(header) => {
                let expected = header.cells.len();
                examples.body.push(row);
                Some((expected, actual))
            }
            None => {
                examples.header = Some(row);
                None
            }
        }
    }

    fn push_step_row(&mut self, row: TableRow, number: usize) -> Option<(usize, usize)> {
        let step = self.steps_mut()?.last_mut()?;
        if step.doc_string.is_some() {
            self.push_diagnostic(
                DiagnosticKind::DuplicateStepArgument,
                number,
                "step already has a doc string; table row ignored",
            );
            return None;
        }
        let actual = row.cells.len();
        let table = step.table.get_or_insert_with(DataTable::default);
        let expected = table.rows.first().map(|first| first.cells.len());
        table.rows.push(row);
        expected.map(|expected| (expected, actual))
    }

    fn open_doc_string(
        &mut self,
        raw: &str,
        delimiter: DocStringDelimiter,
        rest: &str,
        number: usize,
    ) {
        self.description_open = false;
        let attach = if self.cursor == Cursor::Step {
            let has_argument = self
                .steps_mut()
                .and_then(|steps| steps.last())
                .is_some_and(|step| step.table.is_some() || step.doc_string.is_some());
            if has_argument {
                self.push_diagnostic(
                    DiagnosticKind::DuplicateStepArgument,
                    number,
                    "step already has an argument; doc string ignored",
                );
            }
            !has_argument
        } else {
            self.push_diagnostic(
                DiagnosticKind::DocStringOutsideStep,
                number,
                "doc string appears outside a step",
            );
            false
        };
        let media_type = rest.trim();
        self.doc_string = Some(OpenDocString {
            delimiter,
            indent: raw.chars().take_while(|ch| ch.is_whitespace()).count(),
            media_type: (!media_type.is_empty()).then(|| media_type.to_string()),
            lines: Vec::new(),
            line: number,
            attach,
        });
    }

    fn doc_string_line(&mut self, raw: &str) {
        let Some(open) = self.doc_string.as_mut() else {
            return;
        };
        let closes = raw
            .trim_start()
            .strip_prefix(open.delimiter.as_str())
            .is_some_and(|rest| rest.trim().is_empty());
        if closes {
            if let Some(open) = self.doc_string.take() {
                self.close_doc_string(open);
            }
        } else {
            let line = unescape_doc_line(dedent(raw, open.indent), open.delimiter);
            open.lines.push(line);
        }
    }

    fn close_doc_string(&mut self, open: OpenDocString) {
        if !open.attach {
            return;
        }
        if let Some(step) = self.steps_mut().and_then(|steps| steps.last_mut()) {
            step.doc_string = Some(DocString {
                content: open.lines.join("\n"),
                media_type: open.media_type,
                delimiter: open.delimiter,
                line: open.line,
            });
        }
    }

    fn free_text(&mut self, line: &str, number: usize) {
        if self.description_open {
            if let Some(description) = self.description_mut() {
                if !description.is_empty() {
                    description.push('\n');
                }
                description.push_str(line);
                return;
            }
        }
        if self.cursor != Cursor::Ignored {
            self.push_diagnostic(
                DiagnosticKind::UnrecognisedLine,
                number,
                format!("unrecognised line `{line}`"),
            );
        }
    }

    fn description_mut(&mut self) -> Option<&mut String> {
        match self.cursor {
            Cursor::Feature => self.feature.as_mut().map(|feature| &mut feature.description),
            Cursor::Rule => self.rule_mut().map(|rule| &mut rule.description),
            Cursor::Block => match self.block_mut()? {
                Block::Background(background) => Some(&mut background.description),
                Block::Scenario(scenario) => Some(&mut scenario.description),
            },
            Cursor::Examples => self
                .last_scenario_mut()?
                .examples
                .last_mut()
                .map(|examples| &mut examples.description),
            Cursor::Start | Cursor::Ignored | Cursor::Step => None,
        }
    }

    fn rule_mut(&mut self) -> Option<&mut Rule> {
        if !self.in_rule {
            return None;
        }
        match self.feature.as_mut()?.children.last_mut()? {
            FeatureChild::Rule(rule) => Some(rule),
            FeatureChild::Background(_) | FeatureChild::Scenario(_) => None,
        }
    }

    fn block_mut(&mut self) -> Option<Block<'_>> {
        if self.in_rule {
            return match self.rule_mut()?.children.last_mut()? {
                RuleChild::Background(background) => Some(Block::Background(background)),
                RuleChild::Scenario(scenario) => Some(Block::Scenario(scenario)),
            };
        }
        match self.feature.as_mut()?.children.last_mut()? {
            FeatureChild::Background(background) => Some(Block::Background(background)),
            FeatureChild::Scenario(scenario) => Some(Block::Scenario(scenario)),
            FeatureChild::Rule(_) => None,
        }
    }

    fn steps_mut(&mut self) -> Option<&mut Vec<Step>> {
        match self.block_mut()? {
            Block::Background(background) => Some(&mut background.steps),
            Block::Scenario(scenario) => Some(&mut scenario.steps),
        }
    }

    fn last_scenario_mut(&mut self) -> Option<&mut Scenario> {
        match self.block_mut()? {
            Block::Scenario(scenario) => Some(scenario),
            Block::Background(_) => None,
        }
    }

    fn push_child(&mut self, child: RuleChild) {
        if self.in_rule {
            if let Some(rule) = self.rule_mut() {
                rule.children.push(child);
            }
            return;
        }
        if let Some(feature) = self.feature.as_mut() {
            feature.children.push(match child {
                RuleChild::Background(background) => FeatureChild::Background(background),
                RuleChild::Scenario(scenario) => FeatureChild::Scenario(scenario),
            });
        }
    }
}
