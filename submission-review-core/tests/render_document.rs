use std::path::Path;

use submission_review_core::classify::{ClassificationRules, ClassifiedFile};
use submission_review_core::metadata::{IdentityResolver, PositionalResolver, SubmissionIdentity};
use submission_review_core::normalize::{NormalizeMode, NormalizedFile};
use submission_review_core::render::{
    DocumentInfo, DocumentRenderer, RenderContext, RenderError,
};

fn identity() -> SubmissionIdentity {
    SubmissionIdentity {
        raw_name: "Ueding".into(),
        display_name: "Ueding".into(),
        week_id: 3,
        week_label: "03".into(),
    }
}

fn normalized(path: &str) -> NormalizedFile {
    NormalizedFile {
        file: ClassifiedFile::new(path, &ClassificationRules::default()),
        workspace_path: path.to_string(),
        mode: NormalizeMode::Formatted,
        decoding: None,
    }
}

#[test]
fn empty_entries_fail() {
    let renderer = DocumentRenderer::default();
    let ctx = RenderContext::new(&identity(), &DocumentInfo::default(), &[]);
    match renderer.render(&ctx) {
        Err(RenderError::Empty(e)) => assert_eq!(e.submission, "Review-Ueding-03"),
        other => panic!("expected EmptySubmissionError, got {other:?}"),
    }
}

#[test]
fn one_entry_yields_one_embedding_block() {
    let renderer = DocumentRenderer::default();
    let ctx = RenderContext::new(&identity(), &DocumentInfo::default(), &[normalized("my_main.c")]);
    let doc = renderer.render(&ctx).expect("render");

    assert_eq!(doc.matches(r"\inputminted").count(), 1);
    assert_eq!(doc.matches(r"\section*{my\_main.c}").count(), 1, "{doc}");
    assert!(doc.contains("]{c}{my_main.c}"), "{doc}");
    assert!(doc.contains(r"\title{Week 3}"), "{doc}");
    assert!(doc.contains("Ueding"));
}

#[test]
fn entries_keep_their_order() {
    let renderer = DocumentRenderer::default();
    let files = [normalized("b.h"), normalized("a.c"), normalized("notes.txt")];
    let ctx = RenderContext::new(&identity(), &DocumentInfo::default(), &files);
    let doc = renderer.render(&ctx).expect("render");

    let b = doc.find(r"\section*{b.h}").expect("b.h block");
    let a = doc.find(r"\section*{a.c}").expect("a.c block");
    let n = doc.find(r"\section*{notes.txt}").expect("notes block");
    assert!(b < a && a < n);
    assert!(doc.contains("]{text}{notes.txt}"));
}

#[test]
fn optional_decorations_are_rendered_only_when_set() {
    let renderer = DocumentRenderer::default();
    let files = [normalized("a.c")];

    let bare = DocumentInfo {
        subject: None,
        reviewer: None,
        intro: None,
    };
    let doc = renderer
        .render(&RenderContext::new(&identity(), &bare, &files))
        .unwrap();
    assert!(!doc.contains(r"\subject"));
    assert!(!doc.contains(r"\publishers"));
    assert!(!doc.contains("multicols}{2}"));

    let decorated = DocumentInfo {
        subject: Some("Computational Physics".into()),
        reviewer: Some("Tutor: M. Ueding".into()),
        intro: Some("Hello".into()),
    };
    let doc = renderer
        .render(&RenderContext::new(&identity(), &decorated, &files))
        .unwrap();
    assert!(doc.contains(r"\subject{Computational Physics}"), "{doc}");
    assert!(doc.contains("Tutor: M. Ueding"));
    assert!(doc.contains("Hello"));
}

#[test]
fn rendering_is_byte_identical_across_runs() {
    let files = [normalized("a.h"), normalized("a.c")];
    let first = DocumentRenderer::default()
        .render(&RenderContext::new(&identity(), &DocumentInfo::default(), &files))
        .unwrap();
    let second = DocumentRenderer::default()
        .render(&RenderContext::new(&identity(), &DocumentInfo::default(), &files))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn custom_template() {
    let renderer =
        DocumentRenderer::new("{{submitter}}:{{week}}{{#each entries}}|{{label}}@{{path}}{{/each}}")
            .unwrap();
    let doc = renderer
        .render(&RenderContext::new(
            &identity(),
            &DocumentInfo::default(),
            &[normalized("x_y.c")],
        ))
        .unwrap();
    assert_eq!(doc, r"Ueding:3|x\_y.c@x_y.c");
}

#[test]
fn broken_template_is_rejected() {
    assert!(DocumentRenderer::new("{{#each entries}}").is_err());
}

#[test]
fn submitter_special_characters_are_escaped() {
    let identity = PositionalResolver::default()
        .resolve(Path::new("/abgaben/R&D_50%--Q#A/04"))
        .expect("resolves");
    let renderer = DocumentRenderer::default();
    let ctx = RenderContext::new(&identity, &DocumentInfo::default(), &[normalized("main.c")]);
    let doc = renderer.render(&ctx).expect("render");

    assert!(doc.contains(r"R\&D 50\% \and Q\#A"), "{doc}");
    assert_eq!(identity.artifact_stem(), "Review-R&D_50%--Q#A-04");
}
