use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use script_loader::{
    DirEmitter, LoaderOptions, OutputBundle, Plugin, ScriptLoaderPlugin, configure_dev_server,
    run_generate_bundle,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

const MANIFEST: &str = r#"{
  "index.html": { "type": "asset", "fileName": "index.html", "source": "<html></html>" },
  "assets/index.js": { "type": "chunk", "fileName": "assets/index-4f2a.js", "isEntry": true },
  "assets/vendor.js": { "type": "chunk", "fileName": "assets/vendor-91bc.js", "isEntry": false },
  "assets/index.css": { "type": "asset", "fileName": "assets/index-77de.css" },
  "assets/logo.svg": { "type": "asset", "fileName": "assets/logo-0a1b.svg" }
}"#;

fn plugins(options: LoaderOptions) -> Vec<Box<dyn Plugin>> {
    vec![Box::new(ScriptLoaderPlugin::new(options))]
}

#[test]
fn build_writes_loader_next_to_outputs() {
    let bundle = OutputBundle::from_json_str(MANIFEST).unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut emitter = DirEmitter::new(out.path());
    let options = LoaderOptions {
        crossorigin: true,
        crossorigin_val: "anonymous".into(),
        ..LoaderOptions::default()
    };
    run_generate_bundle(&plugins(options), &bundle, &mut emitter).unwrap();

    let written: Vec<&str> = emitter.written().collect();
    assert_eq!(written.len(), 1);
    assert!(written[0].starts_with("app.") && written[0].ends_with(".js"));

    let script = std::fs::read_to_string(out.path().join(written[0])).unwrap();
    let entry = script.find("basePath + 'assets/index-4f2a.js'").unwrap();
    let preload = script.find("basePath + 'assets/vendor-91bc.js'").unwrap();
    let style = script.find("basePath + 'assets/index-77de.css'").unwrap();
    assert!(entry < preload && preload < style);
    assert!(!script.contains("index.html"));
    assert!(!script.contains("logo-0a1b.svg"));
    assert_eq!(script.matches("'crossorigin', 'anonymous'").count(), 1);
    assert!(script.ends_with("})()"));
}

#[test]
fn manifest_file_on_disk_drives_build() {
    let work = tempfile::tempdir().unwrap();
    let manifest = work.path().join("bundle.json");
    std::fs::write(&manifest, MANIFEST).unwrap();
    let bundle = OutputBundle::from_path(&manifest).unwrap();
    assert_eq!(bundle.len(), 5);

    let options = LoaderOptions {
        should_hash: false,
        ..LoaderOptions::default()
    };
    let mut emitter = DirEmitter::new(work.path().join("dist"));
    run_generate_bundle(&plugins(options), &bundle, &mut emitter).unwrap();
    assert_eq!(emitter.written().collect::<Vec<_>>(), vec!["app.js"]);
    assert!(work.path().join("dist/app.js").exists());

    let err = OutputBundle::from_path(&work.path().join("missing.json")).unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn rebuilding_identical_manifest_reuses_name() {
    let bundle = OutputBundle::from_json_str(MANIFEST).unwrap();
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let mut a = DirEmitter::new(first.path());
    let mut b = DirEmitter::new(second.path());
    run_generate_bundle(&plugins(LoaderOptions::default()), &bundle, &mut a).unwrap();
    run_generate_bundle(&plugins(LoaderOptions::default()), &bundle, &mut b).unwrap();
    let a: Vec<&str> = a.written().collect();
    let b: Vec<&str> = b.written().collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn dev_server_answers_virtual_path_before_static_files() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("index.js"), "on disk").unwrap();
    std::fs::write(root.path().join("other.js"), "other on disk").unwrap();

    let options = LoaderOptions {
        dev_entry: "src/main.tsx".into(),
        ..LoaderOptions::default()
    };
    let app = configure_dev_server(
        &plugins(options),
        Router::new().fallback_service(ServeDir::new(root.path())),
    );

    let resp = app
        .clone()
        .oneshot(Request::get("/index.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/javascript"
    );
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("basePath + 'src/main.tsx'"));
    assert!(!body.contains("on disk"));

    let resp = app
        .oneshot(Request::get("/other.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"other on disk");
}
