//! Document tree produced by the parser.
//!
//! Every node records the one-based source line it started on. Line numbers
//! are informational; [`Document::clear_locations`] zeroes them so trees
//! parsed from differently laid out text can be compared.

use bddkit_patterns::KeywordRole;

/// A parsed feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The feature, when the file declares one.
    pub feature: Option<Feature>,
    /// Every `#` comment line, in source order. The `# language:` directive
    /// that selected the dialect is not included; see [`Document::language`].
    pub comments: Vec<Comment>,
    /// Identifier of the source (usually a path), when supplied.
    pub source: Option<String>,
    /// Dialect code the document was parsed with.
    pub language: String,
}

impl Document {
    /// Zero every recorded line number.
    pub fn clear_locations(&mut self) {
        for comment in &mut self.comments {
            comment.line = 0;
        }
        if let Some(feature) = &mut self.feature {
            feature.clear_locations();
        }
    }

    /// Scenarios of the feature, including those nested in rules.
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.feature.iter().flat_map(Feature::scenarios)
    }
}

/// A `#` comment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment text including the leading `#`.
    pub text: String,
    /// Source line.
    pub line: usize,
}

/// A tag attached to a feature, rule, scenario or examples block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name including the `@` sigil.
    pub name: String,
    /// Source line.
    pub line: usize,
}

fn clear_tags(tags: &mut [Tag]) {
    for tag in tags {
        tag.line = 0;
    }
}

/// The top-level `Feature:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Keyword as written.
    pub keyword: String,
    /// Text after the colon.
    pub name: String,
    /// Free text following the header, one entry per line.
    pub description: String,
    /// Tags preceding the header.
    pub tags: Vec<Tag>,
    /// Backgrounds, rules and scenarios in source order.
    pub children: Vec<FeatureChild>,
    /// Source line of the header.
    pub line: usize,
    /// Dialect code.
    pub language: String,
}

impl Feature {
    fn clear_locations(&mut self) {
        self.line = 0;
        clear_tags(&mut self.tags);
        for child in &mut self.children {
            match child {
                FeatureChild::Background(background) => background.clear_locations(),
                FeatureChild::Rule(rule) => rule.clear_locations(),
                FeatureChild::Scenario(scenario) => scenario.clear_locations(),
            }
        }
    }

    /// The feature-level background, if any.
    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.children.iter().find_map(|child| match child {
            FeatureChild::Background(background) => Some(background),
            _ => None,
        })
    }

    /// Every scenario, including those nested in rules.
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.children.iter().flat_map(|child| {
            let (direct, rule) = match child {
                FeatureChild::Scenario(scenario) => (Some(scenario), None),
                FeatureChild::Rule(rule) => (None, Some(rule)),
                FeatureChild::Background(_) => (None, None),
            };
            direct
                .into_iter()
                .chain(rule.into_iter().flat_map(Rule::scenarios))
        })
    }
}

/// A child of a [`Feature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureChild {
    /// Steps prepended to every scenario of the feature.
    Background(Background),
    /// A group of scenarios.
    Rule(Rule),
    /// A scenario directly under the feature.
    Scenario(Scenario),
}

/// A child of a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleChild {
    /// Steps prepended to every scenario of the rule.
    Background(Background),
    /// A scenario inside the rule.
    Scenario(Scenario),
}

/// A `Rule:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Keyword as written.
    pub keyword: String,
    /// Text after the colon.
    pub name: String,
    /// Free text following the header.
    pub description: String,
    /// Tags preceding the header. Feature tags are inherited at evaluation
    /// time and not copied here.
    pub tags: Vec<Tag>,
    /// Backgrounds and scenarios in source order.
    pub children: Vec<RuleChild>,
    /// Source line of the header.
    pub line: usize,
}

impl Rule {
    fn clear_locations(&mut self) {
        self.line = 0;
        clear_tags(&mut self.tags);
        for child in &mut self.children {
            match child {
                RuleChild::Background(background) => background.clear_locations(),
                RuleChild::Scenario(scenario) => scenario.clear_locations(),
            }
        }
    }

    /// The rule-level background, if any.
    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.children.iter().find_map(|child| match child {
            RuleChild::Background(background) => Some(background),
            RuleChild::Scenario(_) => None,
        })
    }

    /// Scenarios of the rule.
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.children.iter().filter_map(|child| match child {
            RuleChild::Scenario(scenario) => Some(scenario),
            RuleChild::Background(_) => None,
        })
    }
}

/// A `Background:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    /// Keyword as written.
    pub keyword: String,
    /// Text after the colon.
    pub name: String,
    /// Free text following the header.
    pub description: String,
    /// Steps in source order.
    pub steps: Vec<Step>,
    /// Source line of the header.
    pub line: usize,
}

impl Background {
    fn clear_locations(&mut self) {
        self.line = 0;
        for step in &mut self.steps {
            step.clear_locations();
        }
    }
}

/// Whether a scenario was declared with the plain or outline keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// `Scenario:` or `Example:`.
    Plain,
    /// `Scenario Outline:` or `Scenario Template:`.
    Outline,
}

/// A scenario or scenario outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Keyword as written.
    pub keyword: String,
    /// Plain or outline.
    pub kind: ScenarioKind,
    /// Text after the colon.
    pub name: String,
    /// Free text following the header.
    pub description: String,
    /// Tags preceding the header.
    pub tags: Vec<Tag>,
    /// Steps in source order, placeholders unexpanded.
    pub steps: Vec<Step>,
    /// Examples blocks following the steps.
    pub examples: Vec<Examples>,
    /// Source line of the header.
    pub line: usize,
}

impl Scenario {
    fn clear_locations(&mut self) {
        self.line = 0;
        clear_tags(&mut self.tags);
        for step in &mut self.steps {
            step.clear_locations();
        }
        for examples in &mut self.examples {
            examples.clear_locations();
        }
    }
}

/// A single step line with its optional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Keyword as written, without trailing whitespace.
    pub keyword: String,
    /// Classification of the keyword in its dialect.
    pub role: KeywordRole,
    /// Text after the keyword.
    pub text: String,
    /// Attached data table.
    pub table: Option<DataTable>,
    /// Attached doc string.
    pub doc_string: Option<DocString>,
    /// Source line.
    pub line: usize,
}

impl Step {
    fn clear_locations(&mut self) {
        self.line = 0;
        if let Some(table) = &mut self.table {
            table.clear_locations();
        }
        if let Some(doc_string) = &mut self.doc_string {
            doc_string.line = 0;
        }
    }
}

/// A row of table cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Unescaped, trimmed cell values.
    pub cells: Vec<String>,
    /// Source line.
    pub line: usize,
}

/// A data table attached to a step. Row 0 is not treated as a header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    /// Rows in source order.
    pub rows: Vec<TableRow>,
}

impl DataTable {
    fn clear_locations(&mut self) {
        for row in &mut self.rows {
            row.line = 0;
        }
    }

    /// Cell values row by row.
    #[must_use]
    pub fn to_vecs(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|row| row.cells.clone()).collect()
    }
}

/// Delimiter used to open a doc string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStringDelimiter {
    /// `"""`
    Quotes,
    /// ```` ``` ````
    Backticks,
}

impl DocStringDelimiter {
    /// The delimiter text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quotes => "\"\"\"",
            Self::Backticks => "```",
        }
    }
}

/// A multi-line string attached to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocString {
    /// Content with the opening indentation removed.
    pub content: String,
    /// Media type written after the opening delimiter.
    pub media_type: Option<String>,
    /// Delimiter style.
    pub delimiter: DocStringDelimiter,
    /// Source line of the opening delimiter.
    pub line: usize,
}

/// An `Examples:` block of a scenario outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Examples {
    /// Keyword as written.
    pub keyword: String,
    /// Text after the colon.
    pub name: String,
    /// Free text following the header.
    pub description: String,
    /// Tags preceding the header.
    pub tags: Vec<Tag>,
    /// First table row, naming the columns.
    pub header: Option<TableRow>,
    /// Remaining rows.
    pub body: Vec<TableRow>,
    /// Source line of the header.
    pub line: usize,
}

impl Examples {
    fn clear_locations(&mut self) {
        self.line = 0;
        clear_tags(&mut self.tags);
        if let Some(header) = &mut self.header {
            header.line = 0;
        }
        for row in &mut self.body {
            row.line = 0;
        }
    }
}
