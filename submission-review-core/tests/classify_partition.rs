use std::collections::HashSet;

use submission_review_core::classify::{
    classify, Category, ClassificationRules, OrderingStrategy,
};

fn sample_files() -> Vec<&'static str> {
    vec![
        "main.c",
        "blatt.pdf",
        "README",
        "helpers.h",
        "notes.TXT",
        "fix.patch",
        "Makefile",
        "a.out",
        "helpers.c",
        "scan.PDF",
        "sub/util.hpp",
    ]
}

#[test]
fn classification_partitions_the_input() {
    let rules = ClassificationRules::default();
    let files = sample_files();
    let out = classify(&files, &rules, OrderingStrategy::InputOrder);

    let total = out.renderables.len() + out.attachments.len() + out.ignored.len();
    assert_eq!(total, files.len(), "every file lands in exactly one sequence");

    let mut seen = HashSet::new();
    for f in out
        .renderables
        .iter()
        .chain(&out.attachments)
        .chain(&out.ignored)
    {
        assert!(seen.insert(f.relative_path.clone()), "duplicate {}", f.relative_path);
    }
    let input: HashSet<String> = files.iter().map(|s| s.to_string()).collect();
    assert_eq!(seen, input);

    assert!(out.renderables.iter().all(|f| f.category != Category::Ignored
        && f.category != Category::ImageAttachment));
    assert!(out.attachments.iter().all(|f| f.category == Category::ImageAttachment));
    assert!(out.ignored.iter().all(|f| f.category == Category::Ignored));
}

#[test]
fn input_order_is_preserved_within_each_sequence() {
    let rules = ClassificationRules::default();
    let out = classify(&sample_files(), &rules, OrderingStrategy::InputOrder);

    let renderables: Vec<_> = out.renderables.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(
        renderables,
        vec!["main.c", "helpers.h", "notes.TXT", "fix.patch", "Makefile", "helpers.c", "sub/util.hpp"]
    );
    let attachments: Vec<_> = out.attachments.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(attachments, vec!["blatt.pdf", "scan.PDF"]);
    let ignored: Vec<_> = out.ignored.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(ignored, vec!["README", "a.out"]);
}

#[test]
fn classification_is_deterministic() {
    let rules = ClassificationRules::default();
    let first = classify(&sample_files(), &rules, OrderingStrategy::InputOrder);
    let second = classify(&sample_files(), &rules, OrderingStrategy::InputOrder);
    assert_eq!(first, second);

    let grouped_a = classify(&sample_files(), &rules, OrderingStrategy::GroupByBaseName);
    let grouped_b = classify(&sample_files(), &rules, OrderingStrategy::GroupByBaseName);
    assert_eq!(grouped_a, grouped_b);
}

#[test]
fn language_tags_follow_category() {
    let rules = ClassificationRules::default();
    let out = classify(
        &["x.cpp", "y.txt", "z.diff", "makefile"],
        &rules,
        OrderingStrategy::InputOrder,
    );
    let tags: Vec<_> = out.renderables.iter().map(|f| f.language_tag).collect();
    assert_eq!(tags, vec![Some("c"), Some("text"), Some("diff"), Some("make")]);
}

#[test]
fn grouping_puts_headers_before_implementations() {
    let rules = ClassificationRules::default();
    let files = ["zeta.c", "main.c", "alpha.c", "zeta.h", "alpha.txt", "alpha.h"];
    let out = classify(&files, &rules, OrderingStrategy::GroupByBaseName);
    let order: Vec<_> = out.renderables.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(
        order,
        vec!["alpha.h", "alpha.c", "alpha.txt", "main.c", "zeta.h", "zeta.c"]
    );
}

#[test]
fn grouping_orders_attachments_separately() {
    let rules = ClassificationRules::default();
    let files = ["b.pdf", "main.c", "a.pdf"];
    let out = classify(&files, &rules, OrderingStrategy::GroupByBaseName);
    let attachments: Vec<_> = out.attachments.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(attachments, vec!["a.pdf", "b.pdf"]);
    assert_eq!(out.renderables.len(), 1);
}

#[test]
fn custom_rules_change_categories() {
    let rules = ClassificationRules {
        source_extensions: vec!["py".into()],
        attachment_extensions: vec!["pdf".into(), "png".into()],
        ..ClassificationRules::default()
    };
    let out = classify(&["a.py", "a.c", "plot.png"], &rules, OrderingStrategy::InputOrder);
    assert_eq!(out.renderables.len(), 1);
    assert_eq!(out.renderables[0].relative_path, "a.py");
    assert_eq!(out.attachments[0].relative_path, "plot.png");
    assert_eq!(out.ignored[0].relative_path, "a.c");
}
