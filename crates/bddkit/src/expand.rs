//! Outline expansion.
//!
//! A scenario with Examples blocks turns into one [`Instance`] per body row:
//! `<column>` placeholders in its name, step text, table cells and doc
//! strings are replaced by the row's values. Filtering happens per block
//! against the scenario tags merged with the block's own tags, and rows of
//! rejected blocks are kept as excluded instances so they can be reported as
//! skipped.

use bddkit_gherkin::{Examples, Scenario, Step, TableRow};
use bddkit_tags::{TagFilter, filter_accepts, merge_tag_sets};

use crate::result::ExampleRef;

/// A runnable scenario: either a plain scenario or one example row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Name after substitution.
    pub name: String,
    /// Scenario steps after substitution, backgrounds excluded.
    pub steps: Vec<Step>,
    /// Effective tags, including the Examples tags for rows.
    pub tags: Vec<String>,
    /// Example row the instance came from.
    pub example: Option<ExampleRef>,
    /// Whether the tag filter accepted the instance.
    pub included: bool,
}

/// Replace every `<column>` in `text` with its value.
///
/// Placeholders are matched by exact column name. Unknown placeholders and
/// stray angle brackets are left as written.
///
/// # Examples
/// ```
/// use bddkit::expand::substitute;
///
/// let values = [("start".to_string(), "12".to_string())];
/// assert_eq!(substitute("there are <start> cucumbers", &values), "there are 12 cucumbers");
/// assert_eq!(substitute("a <b> c < d", &values), "a <b> c < d");
/// ```
#[must_use]
pub fn substitute(text: &str, values: &[(String, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some((before, after)) = rest.split_once('<') else {
            out.push_str(rest);
            return out;
        };
        out.push_str(before);
        let replacement = after
            .split_once('>')
            .filter(|(name, _)| !name.contains('<'))
            .and_then(|(name, tail)| lookup(values, name).map(|value| (value, tail)));
        match replacement {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push('<');
                rest = after;
            }
        }
    }
}

fn lookup<'v>(values: &'v [(String, String)], name: &str) -> Option<&'v str> {
    values
        .iter()
        .find(|(column, _)| column == name)
        .map(|(_, value)| value.as_str())
}

/// Substitute placeholders in a step's text and arguments.
#[must_use]
pub fn substitute_step(step: &Step, values: &[(String, String)]) -> Step {
    let mut expanded = step.clone();
    expanded.text = substitute(&step.text, values);
    if let Some(table) = &mut expanded.table {
        for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
            *cell = substitute(cell, values);
        }
    }
    if let Some(doc_string) = &mut expanded.doc_string {
        doc_string.content = substitute(&doc_string.content, values);
    }
    expanded
}

fn tag_names(tags: &[bddkit_gherkin::Tag]) -> Vec<&str> {
    tags.iter().map(|tag| tag.name.as_str()).collect()
}

fn row_values(header: &TableRow, row: &TableRow) -> Vec<(String, String)> {
    header
        .cells
        .iter()
        .cloned()
        .zip(row.cells.iter().cloned())
        .collect()
}

/// Expand `scenario` into runnable instances.
///
/// `inherited` holds the feature and rule tags. A scenario without Examples
/// yields exactly one instance; otherwise every body row of every block
/// yields one, in source order.
#[must_use]
pub fn expand(scenario: &Scenario, inherited: &[String], filter: Option<&TagFilter>) -> Vec<Instance> {
    let tags = merge_tag_sets(inherited, &tag_names(&scenario.tags));
    if scenario.examples.is_empty() {
        let included = filter_accepts(filter, tags.iter().map(String::as_str));
        return vec![Instance {
            name: scenario.name.clone(),
            steps: scenario.steps.clone(),
            tags,
            example: None,
            included,
        }];
    }
    scenario
        .examples
        .iter()
        .enumerate()
        .flat_map(|(block, examples)| expand_block(scenario, &tags, block, examples, filter))
        .collect()
}

fn expand_block(
    scenario: &Scenario,
    scenario_tags: &[String],
    block: usize,
    examples: &Examples,
    filter: Option<&TagFilter>,
) -> Vec<Instance> {
    let Some(header) = &examples.header else {
        return Vec::new();
    };
    let tags = merge_tag_sets(scenario_tags, &tag_names(&examples.tags));
    let included = filter_accepts(filter, tags.iter().map(String::as_str));
    examples
        .body
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let values = row_values(header, cells);
            Instance {
                name: substitute(&scenario.name, &values),
                steps: scenario
                    .steps
                    .iter()
                    .map(|step| substitute_step(step, &values))
                    .collect(),
                tags: tags.clone(),
                example: Some(ExampleRef { block, row, values }),
                included,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bddkit_gherkin::parse_strict;
    use rstest::rstest;

    fn values(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    fn first_scenario(text: &str) -> Scenario {
        parse_strict(text)
            .unwrap_or_else(|err| panic!("fixture should parse: {err}"))
            .scenarios()
            .next()
            .cloned()
            .unwrap_or_else(|| panic!("fixture should have a scenario"))
    }

    const OUTLINE: &str = "\
@feature
Feature: Cucumbers
  @outline
  Scenario Outline: eat <eat> of <start>
    Given there are <start> cucumbers
    When I eat <eat> cucumbers
      | eaten | <eat> |
    Then I should have <left> cucumbers
      \"\"\"
      left: <left>
      \"\"\"

    @small
    Examples: few
      | start | eat | left |
      | 12    | 5   | 7    |
      | 20    | 5   | 15   |

    @large
    Examples: many
      | start | eat | left |
      | 100   | 50  | 50   |
";

    #[rstest]
    #[case("<a><b>", "12")]
    #[case("<<a>>", "<1>")]
    #[case("<missing> <a>", "<missing> 1")]
    #[case("a > b", "a > b")]
    #[case("unterminated <a", "unterminated <a")]
    #[case("<A>", "<A>")]
    fn substitutes_exact_column_names(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(substitute(text, &values(&[("a", "1"), ("b", "2")])), expected);
    }

    #[test]
    fn rows_become_instances_with_substituted_content() {
        let scenario = first_scenario(OUTLINE);
        let instances = expand(&scenario, &["@feature".to_string()], None);
        assert_eq!(instances.len(), 3);

        let Some(first) = instances.first() else {
            panic!("expected a first instance");
        };
        assert_eq!(first.name, "eat 5 of 12");
        assert_eq!(
            first.steps.iter().map(|s| s.text.as_str()).collect::<Vec<_>>(),
            [
                "there are 12 cucumbers",
                "I eat 5 cucumbers",
                "I should have 7 cucumbers"
            ]
        );
        let table = first
            .steps
            .get(1)
            .and_then(|step| step.table.as_ref())
            .map(bddkit_gherkin::DataTable::to_vecs);
        assert_eq!(table, Some(vec![vec!["eaten".to_string(), "5".to_string()]]));
        let doc = first
            .steps
            .get(2)
            .and_then(|step| step.doc_string.as_ref())
            .map(|doc| doc.content.as_str());
        assert_eq!(doc, Some("left: 7"));
        assert_eq!(first.tags, ["@feature", "@outline", "@small"]);

        let indices: Vec<_> = instances
            .iter()
            .filter_map(|instance| instance.example.as_ref())
            .map(|example| (example.block, example.row))
            .collect();
        assert_eq!(indices, [(0, 0), (0, 1), (1, 0)]);
        assert!(instances.iter().all(|instance| instance.included));
    }

    #[test]
    fn rejected_blocks_are_kept_as_excluded_rows() {
        let scenario = first_scenario(OUTLINE);
        let filter = TagFilter::parse("not @large")
            .unwrap_or_else(|err| panic!("filter should parse: {err}"));
        let included: Vec<_> = expand(&scenario, &[], Some(&filter))
            .iter()
            .map(|instance| instance.included)
            .collect();
        assert_eq!(included, [true, true, false]);
    }

    #[test]
    fn plain_scenarios_yield_one_instance() {
        let scenario =
            first_scenario("Feature: F\n  @wip\n  Scenario: plain <x>\n    Given a step\n");
        let filter =
            TagFilter::parse("@wip").unwrap_or_else(|err| panic!("filter should parse: {err}"));
        let instances = expand(&scenario, &[], Some(&filter));
        assert_eq!(instances.len(), 1);
        let instance = instances.first().unwrap_or_else(|| panic!("one instance"));
        assert_eq!(instance.name, "plain <x>");
        assert!(instance.example.is_none());
        assert!(instance.included);
    }
}
