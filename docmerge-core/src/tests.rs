//! End-to-end test suite for docmerge-core.

use crate::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: &str) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join("docmerge_tests")
        .join(format!("{}_{}", timestamp, id));

    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn class(ns: &str, name: &str) -> SymbolFact {
    SymbolFact::new(FactKind::Class, ns, name, Visibility::Public)
}

fn method(ns: &str, owner: &str, name: &str) -> SymbolFact {
    let mut fact = SymbolFact::new(FactKind::Method, ns, name, Visibility::Public);
    fact.containers = vec![owner.to_string()];
    fact
}

/// Static holder `holder` with one extension `name` on `receiver`.
fn extension_module(module: &str, holder: &str, name: &str, receiver: TypeRef) -> ModuleFacts {
    let mut holder_fact = class("Acme", holder);
    holder_fact.modifiers.is_static = true;
    let mut ext = method("Acme", holder, name);
    ext.modifiers.is_static = true;
    ext.parameters = vec![ParamFact::new("node", receiver.key())];
    ext.extension_receiver = Some(receiver);
    ModuleFacts::new(module).with(holder_fact).with(ext)
}

fn build_module(facts: &ModuleFacts) -> EntityGraph {
    let built = build_graph(facts, &facts.inline_docs(), &ResolveOptions::default()).unwrap();
    relocate(built.value, &RelocateOptions::default()).value
}

// Core Test 1: Identity stability across module runs
#[test]
fn test_identity_stability_across_modules() {
    let mut add = method("Acme.Collections", "Bag`1", "Add");
    add.parameters = vec![ParamFact::new("item", "T")];
    let mut bag = class("Acme.Collections", "Bag");
    bag.type_parameters = vec!["T".to_string()];

    // Same declarations, different module names and fact order
    let first = ModuleFacts::new("One").with(bag.clone()).with(add.clone());
    let second = ModuleFacts::new("Two")
        .with(class("Acme.Collections", "Other"))
        .with(bag)
        .with(add);

    let g1 = build_module(&first);
    let g2 = build_module(&second);

    let key = "Acme.Collections.Bag`1.Add(T)";
    assert!(g1.member_by_key(key).is_some());
    assert!(g2.member_by_key(key).is_some());
    assert!(g1.resolve("Acme.Collections.Bag`1.Add(T)#item").is_some());
}

// Core Test 2: Facts decoded from JSON key the same as in-memory facts
#[test]
fn test_json_facts_key_like_static_facts() {
    let dir = setup_temp_dir();
    let file = dir.join("core.json");
    write_file(
        &file,
        r#"{
            "module": "Core",
            "symbols": [
                { "kind": "class", "namespace": "Acme", "name": "Widget", "visibility": "public" },
                { "kind": "method", "namespace": "Acme", "containers": ["Widget"], "name": "Resize",
                  "visibility": "public",
                  "parameters": [ { "name": "factor", "type_name": "System.Double" } ],
                  "docs": "<summary>Scales the widget.</summary>" }
            ]
        }"#,
    );

    let loaded = JsonFactFile::new(&file).load().unwrap();
    let graph = build_module(&loaded);

    let (_, resize) = graph.member_by_key("Acme.Widget.Resize(System.Double)").unwrap();
    assert_eq!(resize.docs.summary.as_deref(), Some("Scales the widget."));
    fs::remove_dir_all(&dir).ok();
}

// Core Test 3: Merge idempotence
#[test]
fn test_merge_idempotent() {
    let mut run = method("Acme", "Widget", "Run");
    run.docs = Some("<summary>Runs.</summary>".to_string());
    let g = build_module(&ModuleFacts::new("Core").with(class("Acme", "Widget")).with(run));

    let once = merge([g.clone()]);
    let twice = merge([g.clone(), g]);

    assert!(twice.diagnostics.is_empty());
    assert_eq!(once.value.graph(), twice.value.graph());
}

// Core Test 4: Merge commutativity on disjoint input
#[test]
fn test_merge_commutative_on_disjoint_input() {
    let g1 = build_module(&ModuleFacts::new("One").with(class("Acme", "A")).with(method("Acme", "A", "Go")));
    let g2 = build_module(&ModuleFacts::new("Two").with(class("Beta", "B")).with(class("Acme", "C")));

    let ab = merge([g1.clone(), g2.clone()]).value;
    let ba = merge([g2, g1]).value;

    assert_eq!(ab.normalized(), ba.normalized());
    assert_eq!(ab.stats().types, 3);
}

// Core Test 5: Relocation idempotence
#[test]
fn test_relocation_idempotent() {
    let facts = extension_module("Core", "NodeExtensions", "Walk", TypeRef::new("Vendor", "Node"));
    let once = build_module(&facts);
    let outcome = relocate_with_stats(once.clone(), &RelocateOptions::default());

    let (twice, stats) = outcome.value;
    assert_eq!(stats, RelocationStats::default());
    assert_eq!(once, twice);
}

// Core Test 6: Single placeholder per extended key across modules
#[test]
fn test_single_placeholder_across_modules() {
    let node = TypeRef::new("Vendor", "Node");
    let g1 = build_module(&extension_module("One", "OneExtensions", "Walk", node.clone()));
    let g2 = build_module(&extension_module("Two", "TwoExtensions", "Print", node));

    let merged = merge([g1, g2]).value;
    let placeholders: Vec<&TypeEntity> = merged.placeholders().collect();

    assert_eq!(placeholders.len(), 1);
    let node = placeholders[0];
    assert_eq!(node.key, "Vendor.Node");
    assert_eq!(node.members.len(), 2);
    assert!(node.members.iter().all(|m| m.is_extension && m.declaring_type_key == "Vendor.Node"));
    assert!(!merged.contains_type("Acme.OneExtensions"));
    assert!(!merged.contains_type("Acme.TwoExtensions"));
}

// Core Test 7: Visibility filtering
#[test]
fn test_visibility_filtering() {
    let mut hidden = class("Acme", "Hidden");
    hidden.visibility = Visibility::Internal;
    let mut secret = method("Acme", "Widget", "Secret");
    secret.visibility = Visibility::Private;
    let facts = ModuleFacts::new("Core")
        .with(hidden)
        .with(class("Acme", "Widget"))
        .with(method("Acme", "Widget", "Run"))
        .with(secret);

    let graph = build_module(&facts);
    assert!(!graph.contains_type("Acme.Hidden"));
    assert!(graph.member_by_key("Acme.Widget.Run()").is_some());
    assert!(graph.member_by_key("Acme.Widget.Secret()").is_none());
}

// Core Test 8: Override suppression
#[test]
fn test_override_suppression() {
    let mut base_m = method("Acme", "A", "M");
    base_m.modifiers.is_virtual = true;
    let mut derived = class("Acme", "B");
    derived.base_type = Some(TypeRef::new("Acme", "A"));
    let mut derived_m = method("Acme", "B", "M");
    derived_m.modifiers.is_override = true;

    let facts = ModuleFacts::new("Core")
        .with(class("Acme", "A"))
        .with(base_m)
        .with(derived)
        .with(derived_m);

    let graph = build_module(&facts);
    let b = graph.type_by_key("Acme.B").unwrap();
    let entries: Vec<&Member> = b.members.iter().filter(|m| m.name == "M").collect();

    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_override);
    assert!(!entries[0].is_inherited);
    assert_eq!(entries[0].declaring_type_key, "Acme.B");
    assert_eq!(entries[0].overridden_member_key.as_deref(), Some("Acme.A.M()"));
}

// Core Test 9: Absent documentation is None, never empty
#[test]
fn test_absent_versus_empty_documentation() {
    let mut blank = class("Acme", "Blank");
    blank.docs = Some("<summary>   </summary>".to_string());
    let mut partial = class("Acme", "Partial");
    partial.docs = Some("<summary>Only a summary.</summary>".to_string());
    let facts = ModuleFacts::new("Core")
        .with(blank)
        .with(partial)
        .with(class("Acme", "Bare"));

    let graph = build_module(&facts);
    assert!(graph.type_by_key("Acme.Blank").unwrap().docs.summary.is_none());
    assert!(graph.type_by_key("Acme.Bare").unwrap().docs.is_empty());

    let partial = &graph.type_by_key("Acme.Partial").unwrap().docs;
    assert_eq!(partial.summary.as_deref(), Some("Only a summary."));
    assert!(partial.remarks.is_none());
    assert!(partial.see_also.is_none());
}

// Core Test 10: Overlay creates content exactly once for a shared type
#[test]
fn test_overlay_exactly_once_on_disk() {
    let dir = setup_temp_dir();
    let node = TypeRef::new("Vendor", "Node");

    let output = Docmerge::new(DocmergeConfig::default())
        .source(StaticFacts(extension_module("One", "OneExtensions", "Walk", node.clone())))
        .source(StaticFacts(extension_module("Two", "TwoExtensions", "Print", node)))
        .content_store(FsContentStore::new(&dir))
        .run()
        .unwrap();

    assert!(output.diagnostics.is_empty());
    let created = gather_md(&dir);
    assert_eq!(created, vec![dir.join("Vendor").join("Node.md")]);

    // A second run finds the placeholder and creates nothing new
    let store = FsContentStore::new(&dir);
    assert!(store.read("Vendor/Node").unwrap().unwrap().is_placeholder);
    fs::remove_dir_all(&dir).ok();
}

fn gather_md(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().is_some_and(|e| e == "md"))
        .collect();
    files.sort();
    files
}

// Core Test 11: Authored content on disk reaches the graph
#[test]
fn test_authored_content_applied_from_content_dir() {
    let dir = setup_temp_dir();
    write_file(
        &dir.join("Acme").join("Widget.md"),
        "# Acme.Widget\n\n## Usage\nCreate one per window.\n\n## Related APIs\n- Acme.Window\n",
    );

    let config = DocmergeConfig::from_toml_str(&format!(
        "[overlay]\ncontent_dir = {:?}\n",
        dir.to_string_lossy()
    ))
    .unwrap();

    let output = Docmerge::new(config)
        .source(StaticFacts(ModuleFacts::new("Core").with(class("Acme", "Widget"))))
        .run()
        .unwrap();

    let widget = output.value.graph.type_by_key("Acme.Widget").unwrap();
    assert_eq!(widget.docs.overlay.usage.as_deref(), Some("Create one per window."));
    assert_eq!(
        widget.docs.overlay.related_apis,
        Some(vec!["Acme.Window".to_string()])
    );
    fs::remove_dir_all(&dir).ok();
}

// Core Test 12: The full scenario
#[test]
fn test_end_to_end_scenario() {
    let mut base_m = method("Acme", "Base", "M");
    base_m.modifiers.is_virtual = true;
    let mut derived = class("Acme", "Derived");
    derived.base_type = Some(TypeRef::new("Acme", "Base"));
    let mut derived_m = method("Acme", "Derived", "M");
    derived_m.modifiers.is_override = true;

    let mut utility = class("Acme", "Utility");
    utility.modifiers.is_static = true;
    let mut helper = method("Acme", "Utility", "Helper");
    helper.modifiers.is_static = true;
    helper.parameters = vec![ParamFact::new("target", "ExternalType")];
    helper.extension_receiver = Some(TypeRef::new("", "ExternalType"));

    let facts = ModuleFacts::new("Core")
        .with(class("Acme", "Base"))
        .with(base_m)
        .with(derived)
        .with(derived_m)
        .with(utility)
        .with(helper);

    let store = MemoryContentStore::new();
    let output = Docmerge::new(DocmergeConfig::default())
        .source(StaticFacts(facts))
        .content_store(store)
        .run()
        .unwrap();
    let graph = &output.value.graph;

    let derived = graph.type_by_key("Acme.Derived").unwrap();
    let m: Vec<&Member> = derived.members.iter().filter(|m| m.name == "M").collect();
    assert_eq!(m.len(), 1);
    assert!(m[0].is_override);
    assert!(!m[0].is_inherited);

    let external = graph.type_by_key("ExternalType").unwrap();
    assert!(external.is_external_placeholder);
    assert_eq!(external.namespace, "");
    let helper = &external.members[0];
    assert_eq!(helper.name, "Helper");
    assert!(helper.is_extension);
    assert_eq!(helper.extended_type_key.as_deref(), Some("ExternalType"));

    assert!(!graph.contains_type("Acme.Utility"));
}

// Core Test 13: A structurally broken module is dropped, others survive
#[test]
fn test_structural_module_dropped_on_disk() {
    let dir = setup_temp_dir();
    write_file(
        &dir.join("broken.json"),
        r#"{ "module": "Broken", "symbols": [
            { "kind": "method", "namespace": "Acme", "containers": ["Ghost"], "name": "Run", "visibility": "public" }
        ] }"#,
    );
    write_file(
        &dir.join("good.json"),
        r#"{ "module": "Good", "symbols": [
            { "kind": "class", "namespace": "Acme", "name": "Widget", "visibility": "public" }
        ] }"#,
    );
    write_file(&dir.join("garbage.json"), "not json at all");

    let sources = fact_sources(&[dir.clone()]).unwrap();
    assert_eq!(sources.len(), 3);

    let output = Docmerge::new(DocmergeConfig::default())
        .sources(sources)
        .run()
        .unwrap();

    assert_eq!(output.value.modules_built, vec!["Good"]);
    assert_eq!(output.value.modules_dropped, vec!["broken", "garbage"]);
    assert_eq!(output.diagnostics.count(DiagnosticKind::Structural), 1);
    assert_eq!(output.diagnostics.count(DiagnosticKind::ModuleDropped), 2);
    assert!(output.value.graph.contains_type("Acme.Widget"));
    fs::remove_dir_all(&dir).ok();
}

// Core Test 14: Conflicting kinds are audited, first writer kept
#[test]
fn test_merge_conflict_recorded() {
    let g1 = build_module(&ModuleFacts::new("One").with(class("Acme", "Shape")));
    let mut interface = class("Acme", "Shape");
    interface.kind = FactKind::Interface;
    let g2 = build_module(&ModuleFacts::new("Two").with(interface));

    let outcome = merge([g1, g2]);
    assert!(outcome.diagnostics.count(DiagnosticKind::MergeConflict) >= 1);
    assert_eq!(
        outcome.value.type_by_key("Acme.Shape").unwrap().kind,
        TypeKind::Class
    );
}

// Core Test 15: Disabled placeholder synthesis keeps members in place
#[test]
fn test_no_placeholders_reports_unresolved() {
    let config = DocmergeConfig::from_toml_str("[extensions]\nsynthesize_placeholders = false\n").unwrap();
    let facts = extension_module("Core", "NodeExtensions", "Walk", TypeRef::new("Vendor", "Node"));

    let output = Docmerge::new(config)
        .source(StaticFacts(facts))
        .run()
        .unwrap();

    assert_eq!(output.diagnostics.count(DiagnosticKind::UnresolvedExtension), 1);
    assert!(output.value.graph.contains_type("Acme.NodeExtensions"));
    assert_eq!(output.value.graph.placeholders().count(), 0);
}

// Core Test 16: Every declaring type key resolves in the merged graph
#[test]
fn test_declaring_types_resolve_in_merged_graph() {
    let mut to_string = method("System", "Object", "ToString");
    to_string.modifiers.is_virtual = true;
    to_string.docs = Some("<summary>Text form.</summary>".to_string());
    let mut object = class("System", "Object");
    object.docs = Some("<summary>Root of every class.</summary>".to_string());
    let runtime = ModuleFacts::new("Runtime").with(object).with(to_string);

    let app = ModuleFacts::new("App")
        .with(class("Acme", "Widget"))
        .with(method("Acme", "Widget", "Run"));

    let output = Docmerge::new(DocmergeConfig::default())
        .source(StaticFacts(app))
        .reference(StaticFacts(runtime))
        .run()
        .unwrap();
    let graph = &output.value.graph;

    let (_, inherited) = graph.member_by_key("Acme.Widget.ToString()").unwrap();
    assert!(inherited.is_inherited);
    assert_eq!(inherited.declaring_type_key, "System.Object");

    for ty in graph.types() {
        for member in &ty.members {
            assert!(
                graph.contains_type(&member.declaring_type_key),
                "{} declared on missing type {}",
                member.key,
                member.declaring_type_key
            );
        }
    }

    let object = graph.type_by_key("System.Object").unwrap();
    assert!(!object.is_external_placeholder);
    assert!(object.members.is_empty());
    assert_eq!(object.docs.summary.as_deref(), Some("Root of every class."));
    assert!(graph.unit("App").unwrap().namespaces.contains(&"System".to_string()));
    assert!(output.diagnostics.is_empty());
}

// Config Test: docmerge.toml drives the pipeline options
#[test]
fn test_config_loading() {
    let dir = setup_temp_dir();
    write_file(
        &dir.join("docmerge.toml"),
        "[inheritance]\ninclude_universal_base_members = false\n",
    );

    let config = load_config(&dir).unwrap().unwrap();
    assert!(!config.resolve_options().include_universal_base_members);
    fs::remove_dir_all(&dir).ok();
}

// Logging Test: helpers are safe without a subscriber
#[test]
fn test_logging_does_not_panic() {
    log_info("info");
    log_warn("warn");
    log_error("error");
    log_event("WARN", "event");
}

// Graph Test: the merged graph serializes and reloads with its index
#[test]
fn test_graph_json_round_trip_keeps_index() {
    let g = build_module(&ModuleFacts::new("Core").with(class("Acme", "Widget")).with(method("Acme", "Widget", "Run")));
    let json = serde_json::to_string(&g).unwrap();
    let back: EntityGraph = serde_json::from_str(&json).unwrap();

    assert_eq!(g, back);
    assert!(back.member_by_key("Acme.Widget.Run()").is_some());
}
