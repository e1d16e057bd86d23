use journey_core::{
    CatalogDocument, CompletionSet, NodeRecord, NodeType, ProgressSnapshot, RecommendationSettings,
    Validate,
};

#[test]
fn test_catalog_document_accepts_both_shapes() {
    let bare = r#"[{ "id": "a", "type": "spiral",
        "position": { "spiralPosition": { "angle": 0.0, "radius": 10.0, "order": 1 } } }]"#;
    let wrapped = r#"{ "nodes": [{ "id": "a", "type": "spiral",
        "position": { "spiralPosition": { "theta": 0.0, "r": 10.0, "order": 1 } } }] }"#;

    let bare: CatalogDocument = serde_json::from_str(bare).unwrap();
    let wrapped: CatalogDocument = serde_json::from_str(wrapped).unwrap();
    assert_eq!(bare.into_nodes(), wrapped.into_nodes());
}

#[test]
fn test_node_record_wire_format() {
    let json = r#"{
        "id": "roots",
        "type": "hybrid",
        "title": "Roots",
        "dependencies": ["seed"],
        "tags": ["ground", "origin", "ground"],
        "position": {
            "treePosition": { "x": 10, "y": -4.5, "branch": "trunk", "level": 1, "parent_id": "seed" },
            "spiralPosition": { "angle": 1.57, "radius": 30, "order": 2 }
        }
    }"#;

    let node: NodeRecord = serde_json::from_str(json).unwrap();
    assert_eq!(node.node_type, NodeType::Hybrid);
    assert_eq!(node.dependencies, vec!["seed".to_string()]);
    assert_eq!(node.tags.len(), 2);
    assert_eq!(node.tree_parent(), Some("seed"));
    assert_eq!(node.spiral_position().unwrap().order, 2);
    assert!(node.validate().is_ok());

    // Serialized form uses camelCase throughout.
    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(value["type"], "hybrid");
    assert_eq!(value["position"]["treePosition"]["parentId"], "seed");
}

#[test]
fn test_unknown_type_is_rejected_at_parse() {
    let json = r#"{ "id": "x", "type": "orbit" }"#;
    assert!(serde_json::from_str::<NodeRecord>(json).is_err());
    assert!("orbit".parse::<NodeType>().is_err());
    assert_eq!(" Tree ".parse::<NodeType>().unwrap(), NodeType::Tree);
}

#[test]
fn test_progress_snapshot_accepts_flag_map() {
    let json = r#"{
        "completed": { "a": true, "b": false, "c": true },
        "settings": { "currentSpiralOrder": 3 }
    }"#;
    let snapshot: ProgressSnapshot = serde_json::from_str(json).unwrap();
    assert!(snapshot.completed.contains("a"));
    assert!(!snapshot.completed.contains("b"));
    assert_eq!(snapshot.completed.len(), 2);
    assert_eq!(snapshot.settings.current_spiral_order, Some(3));
    assert!(snapshot.settings.prefer_spiral_continuation);

    // Written back as a plain id list.
    let value = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(value["completed"], serde_json::json!(["a", "c"]));
    let reparsed: ProgressSnapshot = serde_json::from_value(value).unwrap();
    assert_eq!(reparsed, snapshot);
}

#[test]
fn test_completion_set_mark() {
    let mut set = CompletionSet::new();
    assert!(set.mark("a", true));
    assert!(!set.mark("a", true));
    assert!(set.mark("a", false));
    assert!(!set.mark("a", false));
    assert!(set.is_empty());

    let settings = RecommendationSettings::default()
        .with_current_node("a")
        .with_current_spiral_order(4)
        .with_spiral_continuation(false);
    assert_eq!(settings.current_node_id.as_deref(), Some("a"));
    assert_eq!(settings.current_spiral_order, Some(4));
    assert!(!settings.prefer_spiral_continuation);
}
