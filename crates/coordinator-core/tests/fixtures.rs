use coordinator_core::locator::COORD_MISSING_SELECTOR;
use coordinator_core::{
    CoordinateState, Coordinator, CoordinatorConfig, DocumentTree, ParsoidDocument,
    TemplateAliases,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

fn fixtures_root() -> PathBuf {
    workspace_root().join("fixtures")
}

fn list_fixture_pages(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|e| e == "html"))
        .collect();
    out.sort();
    out
}

fn fixture_aliases() -> TemplateAliases {
    let path = fixtures_root().join("redirects.json");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    let table: BTreeMap<String, Vec<String>> = serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("invalid redirects {}: {e}", path.display()));
    table
        .into_iter()
        .fold(TemplateAliases::new(), |aliases, (canonical, redirects)| {
            aliases.with(canonical, redirects)
        })
}

fn load(path: &Path) -> ParsoidDocument {
    let html = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
    ParsoidDocument::parse(html)
        .unwrap_or_else(|e| panic!("failed to index {}: {e}", path.display()))
}

fn has_missing_placeholder(doc: &ParsoidDocument) -> bool {
    doc.find_first(COORD_MISSING_SELECTOR)
        .expect("valid selector")
        .is_some()
}

#[test]
fn fixtures_match_golden_targets() {
    let pages = list_fixture_pages(&fixtures_root().join("pages"));
    assert!(
        !pages.is_empty(),
        "no fixtures found under {}",
        fixtures_root().display()
    );

    let coordinator = Coordinator::new(CoordinatorConfig::default(), fixture_aliases());
    for path in pages {
        let doc = load(&path);
        let target = coordinator
            .locator()
            .locate(&doc, has_missing_placeholder(&doc))
            .unwrap_or_else(|e| panic!("locate failed for {}: {e}", path.display()));

        let golden_path = path.with_extension("golden.json");
        let golden_text = std::fs::read_to_string(&golden_path)
            .unwrap_or_else(|_| panic!("missing golden target {}", golden_path.display()));
        let golden: Value = serde_json::from_str(&golden_text)
            .unwrap_or_else(|e| panic!("invalid golden JSON {}: {e}", golden_path.display()));

        assert_eq!(
            serde_json::to_value(&target).unwrap(),
            golden,
            "target mismatch for {}",
            path.display()
        );
    }
}

#[test]
fn applying_to_fixtures_leaves_exactly_one_coord() {
    let coordinator = Coordinator::new(CoordinatorConfig::default(), fixture_aliases());
    let coord = coordinator.aliases().matcher("Template:Coord");

    for path in list_fixture_pages(&fixtures_root().join("pages")) {
        let mut doc = load(&path);
        let from_missing = has_missing_placeholder(&doc);
        let mut state = CoordinateState::placeholder(from_missing)
            .with_coordinates(40.68927, -74.04454)
            .unwrap();
        state.set_use_dms(true);
        coordinator
            .apply(&state, &mut doc)
            .unwrap_or_else(|e| panic!("apply failed for {}: {e}", path.display()));

        let reparsed = ParsoidDocument::parse(doc.serialize()).unwrap();
        let coords: Vec<_> = reparsed
            .find_all("[data-mw]")
            .unwrap()
            .into_iter()
            .filter_map(|node| reparsed.payload(node).unwrap())
            .flat_map(|payload| payload.templates().cloned().collect::<Vec<_>>())
            .filter(|template| coord.matches(template))
            .collect();
        assert_eq!(coords.len(), 1, "coord count for {}", path.display());

        let wt: Vec<&str> = coords[0].params.values().map(|v| v.wt.as_str()).collect();
        assert_eq!(
            &wt[..8],
            &["40", "41", "21", "N", "74", "2", "40", "W"],
            "params for {}",
            path.display()
        );
    }
}
