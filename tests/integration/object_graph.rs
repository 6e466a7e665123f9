//! Configuration documents turned into object graphs.

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use useful::config::{ConfigLoader, ConfigSource};
use useful::core::UsefulError;
use useful::creator::{
    Arguments, BuiltValue, DottedPathResolver, GenericMarkers, TypeRegistry, create, inject,
};
use useful::resource::ResourceLoader;
use useful::test_utils::{ConfigFixture, init_test_logging};
use useful::value::ValueGraph;

#[derive(Debug)]
struct Widget {
    size: i64,
}

#[derive(Debug)]
struct Service {
    name: String,
    widget: Arc<Widget>,
}

fn registry(constructed: Arc<AtomicUsize>) -> DottedPathResolver {
    let mut registry = TypeRegistry::new();
    registry.register("pkg.Widget", move |args: Arguments| {
        constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Widget { size: args.i64("size")? })
    });
    registry.register("pkg.Service", |args: Arguments| {
        Ok(Service {
            name: args.string("name")?,
            widget: args.instance::<Widget>("widget")?,
        })
    });
    DottedPathResolver::new(registry)
}

#[test]
fn test_duplicate_configs_build_distinct_instances() {
    init_test_logging(None);
    let counter = Arc::new(AtomicUsize::new(0));
    let graph = ValueGraph::from_json(&json!({
        "svc": {"pkg.Widget": {"size": 3}},
        "other": {"pkg.Widget": {"size": 3}},
    }));

    let built = create(&graph, &registry(Arc::clone(&counter))).unwrap();
    let svc = built.get("svc").unwrap().as_instance().unwrap();
    let other = built.get("other").unwrap().as_instance().unwrap();

    assert!(!svc.ptr_eq(other));
    assert_eq!(svc.downcast_ref::<Widget>().unwrap().size, 3);
    assert_eq!(other.downcast_ref::<Widget>().unwrap().size, 3);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_yaml_anchors_share_instances() -> Result<()> {
    let fixture = ConfigFixture::new()?;
    let uri = fixture.write(
        "service.yaml",
        r#"
shared: &widget
  pkg.Widget:
    size: 7
api:
  pkg.Service:
    name: api
    widget: *widget
worker:
  pkg.Service:
    name: worker
    widget: *widget
"#,
    )?;

    let counter = Arc::new(AtomicUsize::new(0));
    let loader = ConfigLoader::new(ResourceLoader::new(), registry(Arc::clone(&counter)));
    let config = loader.load(ConfigSource::Url(uri)).await?;

    let api = config.get_path("api")?.downcast::<Service>().unwrap();
    let worker = config.get_path("worker")?.downcast::<Service>().unwrap();
    let shared = config.get_path("shared")?.downcast::<Widget>().unwrap();

    assert_eq!(api.name, "api");
    assert_eq!(worker.name, "worker");
    assert!(Arc::ptr_eq(&api.widget, &worker.widget));
    assert!(Arc::ptr_eq(&api.widget, &shared));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_generic_markers_and_placeholders_from_json_file() -> Result<()> {
    let fixture = ConfigFixture::new()?;
    let uri = fixture.write(
        "app.json",
        r#"{
            "widget": {"class": {"module": "pkg", "name": "Widget"}, "params": {"size": 2}},
            "listen": {"port": "<port>", "host": "<host>"}
        }"#,
    )?;

    let loader = ConfigLoader::new(ResourceLoader::new(), registry(Arc::default()))
        .with_generic_markers(GenericMarkers::default());
    let mut config = (*loader.load(ConfigSource::Url(uri)).await?).clone();
    assert_eq!(config.get_path("widget")?.downcast::<Widget>().unwrap().size, 2);

    let substitutions = [("port".to_string(), BuiltValue::from(8080))].into_iter().collect();
    assert_eq!(inject(&mut config, &substitutions), 1);
    assert_eq!(
        config.get_path("listen")?.to_json(),
        json!({"port": 8080, "host": "<host>"})
    );
    Ok(())
}

#[tokio::test]
async fn test_construction_failure_reports_type_path() -> Result<()> {
    let fixture = ConfigFixture::new()?;
    let uri = fixture.write("bad.yaml", "svc:\n  pkg.Widget:\n    size: large\n")?;

    let loader = ConfigLoader::new(ResourceLoader::new(), registry(Arc::default()));
    let error = loader.load(ConfigSource::Url(uri)).await.unwrap_err();
    match error.downcast_ref::<UsefulError>() {
        Some(UsefulError::Construction { type_path, .. }) => assert_eq!(type_path, "pkg.Widget"),
        other => panic!("expected construction error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_self_referencing_anchor_is_rejected() -> Result<()> {
    let fixture = ConfigFixture::new()?;
    let uri = fixture.write("cycle.yaml", "root: &a\n  child: *a\n")?;

    let loader = ConfigLoader::new(ResourceLoader::new(), registry(Arc::default()));
    let error = loader.load(ConfigSource::Url(uri)).await.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<UsefulError>(),
        Some(UsefulError::CyclicReference { .. })
    ));
    Ok(())
}
