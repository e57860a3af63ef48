use anyhow::Result;
use std::{cell::RefCell, fs, path::Path, rc::Rc};
use tempfile::TempDir;

use dockerfile_suite::{
    cli,
    models::{ImageBuildSpec, ImageTag},
    publisher::PublishOptions,
    services::ImageBackend,
};

const DIST_YML: &str = r#"
debian:
  - bionic
  - !regexp '(\d+\.\d+)-slim$'
"#;

const SUITE_YML: &str = r#"
registry: ""
latest: bionic
variants:
  - ~
  - slim
"#;

fn image_dir(root: &Path) -> std::path::PathBuf {
    fs::write(root.join("dist.yml"), DIST_YML).unwrap();

    let image_dir = root.join("images").join("base");
    fs::create_dir_all(&image_dir).unwrap();
    fs::write(image_dir.join("suite.yml"), SUITE_YML).unwrap();
    fs::write(
        image_dir.join("Dockerfile.template"),
        "FROM {{ dist }}:{{ version }}\n",
    )
    .unwrap();
    fs::write(
        image_dir.join("Dockerfile.template-slim"),
        "FROM {{ dist }}:{{ version }}-slim\nLABEL suite={{ suite }}\n",
    )
    .unwrap();

    image_dir
}

fn suites(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn update_renders_every_suite_and_variant() {
    let root = TempDir::new().unwrap();
    let image_dir = image_dir(root.path());

    let mut out = Vec::new();
    let composition =
        cli::update(&image_dir, &suites(&["bionic", "18.04-slim"]), &mut out).unwrap();
    assert_eq!(composition.contexts.len(), 4);

    let read = |path: &str| fs::read_to_string(image_dir.join(path)).unwrap();
    assert_eq!(read("bionic/Dockerfile"), "FROM debian:bionic\n");
    assert_eq!(
        read("bionic/slim/Dockerfile"),
        "FROM debian:bionic-slim\nLABEL suite=bionic\n"
    );
    assert_eq!(read("18.04-slim/Dockerfile"), "FROM debian:18.04\n");
    assert_eq!(
        read("18.04-slim/slim/Dockerfile"),
        "FROM debian:18.04-slim\nLABEL suite=18.04-slim\n"
    );

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("+FROM debian:bionic"));
    assert!(!printed.contains("WARN"));

    // Nothing changed, so nothing is printed the second time.
    let mut out = Vec::new();
    cli::update(&image_dir, &suites(&["bionic", "18.04-slim"]), &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn update_discovers_suites() {
    let root = TempDir::new().unwrap();
    let image_dir = image_dir(root.path());
    fs::create_dir(image_dir.join("bionic")).unwrap();

    let mut out = Vec::new();
    let composition = cli::update(&image_dir, &[], &mut out).unwrap();

    let pairs = composition
        .contexts
        .iter()
        .map(|ctx| (ctx.suite.as_str(), ctx.variant.as_deref()))
        .collect::<Vec<_>>();
    assert_eq!(pairs, vec![("bionic", None), ("bionic", Some("slim"))]);
}

#[test]
fn update_skips_unmapped_suites() {
    let root = TempDir::new().unwrap();
    let image_dir = image_dir(root.path());

    let mut out = Vec::new();
    let composition = cli::update(&image_dir, &suites(&["trusty", "bionic"]), &mut out).unwrap();
    assert_eq!(composition.unmapped, vec!["trusty".to_string()]);

    // bionic comes after trusty and is still rendered.
    assert!(image_dir.join("bionic/Dockerfile").is_file());
    assert!(image_dir.join("bionic/slim/Dockerfile").is_file());
    assert!(!image_dir.join("trusty").exists());

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("WARN").count(), 1);
    assert!(printed.contains("`trusty'"));
    assert!(!printed.contains("trusty/Dockerfile"));
}

#[derive(Clone, Default)]
struct RecordingBackend {
    calls: Rc<RefCell<Vec<String>>>,
}

impl ImageBackend for RecordingBackend {
    fn build_image(&mut self, spec: &ImageBuildSpec) -> Result<bool> {
        self.calls.borrow_mut().push(format!("build {}", spec.tag));
        Ok(true)
    }

    fn tag_image(&mut self, source: &ImageTag, target: &ImageTag) -> Result<bool> {
        self.calls
            .borrow_mut()
            .push(format!("tag {} {}", source, target));
        Ok(true)
    }

    fn push_image(&mut self, tag: &ImageTag) -> Result<bool> {
        self.calls.borrow_mut().push(format!("push {}", tag));
        Ok(true)
    }
}

#[test]
fn publish_builds_tags_and_pushes_in_order() {
    let root = TempDir::new().unwrap();
    let image_dir = image_dir(root.path());
    let backend = RecordingBackend::default();
    let calls = backend.calls.clone();

    let mut out = Vec::new();
    let failures = cli::publish(
        &image_dir,
        &suites(&["bionic", "trusty"]),
        PublishOptions::default(),
        backend,
        &mut out,
    )
    .unwrap();

    assert_eq!(failures, 0);
    assert_eq!(
        *calls.borrow(),
        vec![
            "build base:bionic",
            "tag base:bionic base:latest",
            "push base:bionic",
            "build base:bionic-slim",
            "push base:bionic-slim",
            "build base:trusty",
            "push base:trusty",
            "build base:trusty-slim",
            "push base:trusty-slim",
        ]
    );

    // trusty has no mapping; it is reported once and still published.
    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("WARN").count(), 1);
    assert!(printed.contains("`trusty'"));
}

#[test]
fn missing_dist_file_is_fatal() {
    let root = TempDir::new().unwrap();
    let image_dir = root.path().join("base");
    fs::create_dir(&image_dir).unwrap();
    fs::write(image_dir.join("Dockerfile.template"), "FROM scratch\n").unwrap();

    let mut out = Vec::new();
    let err = cli::update(&image_dir, &suites(&["bionic"]), &mut out).unwrap_err();
    assert!(err.to_string().contains("dist.yml"));
}
