//! Tests for Mermaid diagram generation from Makefile text.

use monocle::mermaid_gen::{DIAGRAM_HEADER, Direction, generate, generate_with};
use monocle::record::Tokenized;
use monocle::tokenizer::{MakefileTokenizer, Tokenize, TokenizeError, TokenizeOptions};
use proptest::prelude::*;
use rstest::rstest;
use test_support::{SCENARIO_DIAGRAM_LR, SCENARIO_MAKEFILE, scenario_diagram_tb};

#[rstest]
fn scenario_left_to_right() {
    let diagram = generate(SCENARIO_MAKEFILE, Direction::LeftRight).expect("generate");
    assert_eq!(diagram, SCENARIO_DIAGRAM_LR);
}

#[rstest]
fn scenario_top_to_bottom_only_changes_direction() {
    let diagram = generate(SCENARIO_MAKEFILE, Direction::TopBottom).expect("generate");
    assert_eq!(diagram, scenario_diagram_tb());
}

#[rstest]
fn default_direction_is_left_to_right() {
    let diagram = generate(SCENARIO_MAKEFILE, Direction::default()).expect("generate");
    assert!(diagram.contains("\ngraph LR\n"));
}

#[rstest]
#[case::empty("")]
#[case::blank_lines("\n\n   \n")]
#[case::comments_only("# nothing to see\n# here\n")]
#[case::variables_only("CC = gcc\nCFLAGS := -O2\n")]
#[case::phony_only(".PHONY: all clean\n")]
#[case::special_targets(".SUFFIXES:\n.DEFAULT: fallback\n")]
fn inputs_without_targets_yield_empty_string(#[case] makefile: &str) {
    assert_eq!(generate(makefile, Direction::LeftRight).expect("generate"), "");
}

#[rstest]
fn dot_targets_are_not_declared_but_may_be_dependencies() {
    let diagram = generate(".PHONY: all\nall: .stamp\n", Direction::LeftRight)
        .expect("generate");
    assert_eq!(
        diagram,
        concat!(
            "%% Mermaid diagram\n",
            "graph LR\n",
            "  node_0[\"all\"]:::target\n",
            "    node_0[\"all\"] --> node_1[\".stamp\"]",
        )
    );
}

#[rstest]
fn target_without_dependencies_is_declared_alone() {
    let diagram = generate("clean:\n\trm -rf build\n", Direction::LeftRight).expect("generate");
    assert_eq!(
        diagram,
        format!("{DIAGRAM_HEADER}\ngraph LR\n  node_0[\"clean\"]:::target")
    );
}

#[rstest]
fn repeated_target_is_declared_per_rule_with_one_identifier() {
    let diagram = generate("a: b\na: c\n", Direction::LeftRight).expect("generate");
    let lines: Vec<&str> = diagram.lines().collect();
    assert_eq!(
        lines,
        [
            "%% Mermaid diagram",
            "graph LR",
            "  node_0[\"a\"]:::target",
            "    node_0[\"a\"] --> node_1[\"b\"]",
            "  node_0[\"a\"]:::target",
            "    node_0[\"a\"] --> node_2[\"c\"]",
        ]
    );
}

#[rstest]
fn target_named_like_an_identifier_gets_a_fresh_one() {
    let diagram = generate("@: node_0\n", Direction::LeftRight).expect("generate");
    assert!(
        diagram.ends_with("    node_0[\"@\"] --> node_1[\"node_0\"]"),
        "diagram: {diagram}"
    );
}

#[rstest]
fn labels_keep_raw_names() {
    let diagram = generate("out/%.o: src/%.c $(HDRS)\n", Direction::LeftRight)
        .expect("generate");
    assert!(diagram.contains("node_0[\"out/%.o\"]:::target"));
    assert!(diagram.contains("--> node_1[\"src/%.c\"]"));
    assert!(diagram.contains("--> node_2[\"$(HDRS)\"]"));
}

#[rstest]
fn every_target_of_a_multi_target_rule_is_drawn() {
    let diagram = generate("x y: z\n", Direction::LeftRight).expect("generate");
    assert!(diagram.contains("  node_0[\"x\"]:::target\n    node_0[\"x\"] --> node_1[\"z\"]"));
    assert!(diagram.contains("  node_2[\"y\"]:::target\n    node_2[\"y\"] --> node_1[\"z\"]"));
}

#[rstest]
fn strict_tokenizer_failure_propagates_unchanged() {
    let tokenizer = MakefileTokenizer::new(TokenizeOptions { strict: true });
    let err = generate_with(&tokenizer, SCENARIO_MAKEFILE, Direction::LeftRight)
        .expect_err("strict mode rejects stray shell lines");
    assert_eq!(err.line(), 3);
}

/// A tokenizer that refuses every input.
struct Refusing;

impl Tokenize for Refusing {
    fn tokenize(&self, text: &str) -> Result<Tokenized, TokenizeError> {
        MakefileTokenizer::new(TokenizeOptions { strict: true })
            .with_source_name("refusing")
            .tokenize(&format!("???\n{text}"))
    }
}

#[rstest]
fn custom_tokenizer_errors_are_returned() {
    let err = generate_with(&Refusing, "a: b\n", Direction::LeftRight).expect_err("refused");
    assert_eq!(err.line(), 1);
}

proptest! {
    #[test]
    fn generation_is_deterministic(
        rules in prop::collection::vec(("[a-z#.]{1,4}", prop::collection::vec("[a-z#]{1,3}", 0..4)), 0..8),
        top_bottom in any::<bool>(),
    ) {
        let makefile: String = rules
            .iter()
            .map(|(target, deps)| format!("{target}: {}\n", deps.join(" ")))
            .collect();
        let direction = if top_bottom { Direction::TopBottom } else { Direction::LeftRight };
        let first = generate(&makefile, direction).expect("generate");
        let second = generate(&makefile, direction).expect("generate");
        prop_assert_eq!(&first, &second);
        if !first.is_empty() {
            prop_assert!(first.starts_with(DIAGRAM_HEADER));
        }
    }

    #[test]
    fn filtered_names_never_start_a_line(
        rules in prop::collection::vec(("[a-z#.]{1,4}", prop::collection::vec("[a-z.]{1,3}", 0..4)), 0..8),
    ) {
        let makefile: String = rules
            .iter()
            .map(|(target, deps)| format!("{target}: {}\n", deps.join(" ")))
            .collect();
        let diagram = generate(&makefile, Direction::LeftRight).expect("generate");
        for line in diagram.lines().skip(2) {
            let label = line
                .split_once("[\"")
                .map(|(_, rest)| rest)
                .expect("node label");
            prop_assert!(!label.starts_with(['#', '.']), "line: {}", line);
        }
    }
}
