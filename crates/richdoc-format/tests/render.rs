use pretty_assertions::assert_eq;
use richdoc_config::OutputFormat;
use richdoc_format::Renderer;
use richdoc_outline::SectionSource;
use richdoc_reconcile::repair_with_details;
use richdoc_test_support::{sample_document, section_context, test_config};
use serde_json::{json, Value};

#[test]
fn renderer_follows_configured_format() {
    let renderer = Renderer::from_config(&test_config());
    assert_eq!(renderer.format(), OutputFormat::Plain);
}

#[test]
fn plain_outline_of_sample_document() {
    let document = sample_document();
    let rendered = Renderer::new(OutputFormat::Plain)
        .outline(&document.outline())
        .unwrap();
    assert_eq!(rendered, "# Overview\n  ## Details\n# Usage\n");
}

#[test]
fn plain_sections_list_paragraphs_with_indices() {
    let document = sample_document();
    let outline = document.outline();
    let sections: Vec<_> = [&outline[0], &outline[2]]
        .into_iter()
        .map(|heading| {
            let context = document.section_context(&heading.id).unwrap();
            (heading.clone(), context)
        })
        .collect();

    let rendered = Renderer::new(OutputFormat::Plain)
        .sections(&sections)
        .unwrap();
    assert_eq!(
        rendered,
        "# Overview\n\
         [0] The editor keeps documents as blocks.\n\
         [1] Each block has a stable id.\n\
         [2] Details\n\
         [3] Undo restores whole snapshots.\n\
         \n\
         # Usage\n\
         [0] Run the outline command first.\n"
    );
}

#[test]
fn json_repair_report_lists_fallbacks() {
    let context = section_context(["one", "two", "three"]);
    let raw = json!([{ "index": 0, "text": "ONE" }]);
    let (paragraphs, report) = repair_with_details(&context, Some(&raw));

    let rendered = Renderer::new(OutputFormat::Json)
        .repair(&report, &paragraphs)
        .unwrap();
    let value: Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["command"], "repair");
    assert_eq!(value["report"]["input_type"], "array");
    assert_eq!(value["report"]["fallback_indices"], json!([1, 2]));
    assert_eq!(value["paragraphs"][0]["text"], "ONE");
    assert_eq!(value["paragraphs"][2]["text"], "three");
}
