//! End-to-end build tests: discovery through emission, then resolution
//! against the emitted tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::compose::{Binding, ComposedPage, PageBindings, PageComposer, PassthroughComposer, StateDeclaration};
use crate::config::BuildConfig;
use crate::error::{BuildWarning, CompileError};
use crate::parse::SourceDocument;
use crate::pipeline::build_site;
use crate::resolve::{Resolution, RouteResolver};

fn write_pages(root: &Path, pages: &[(&str, &str)]) {
    for (relative, markup) in pages {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, markup).unwrap();
    }
}

fn config(pages_dir: PathBuf, out_dir: PathBuf) -> BuildConfig {
    BuildConfig {
        pages_dir,
        out_dir,
        ..BuildConfig::default()
    }
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn sample_site(root: &Path) {
    write_pages(
        root,
        &[
            (
                "index.zen",
                r#"<h1>Home</h1><button onclick="increment">+</button><script>function increment() {}</script><style>h1 { color: red; }</style>"#,
            ),
            ("about.zen", "<h1>About</h1>"),
            ("blog/index.zen", "<h1>Blog</h1><script>console.log('blog');</script>"),
            (
                "blog/post.zen",
                r#"<html><head><title>Post</title></head><body><form onsubmit="save"><input oninput="track"></form></body></html>"#,
            ),
        ],
    );
}

struct FailOn(&'static str);

impl PageComposer for FailOn {
    fn compose(&self, document: SourceDocument, path: &Path) -> Result<ComposedPage, CompileError> {
        if path.ends_with(self.0) {
            return Err(CompileError::parse(path, "composer rejected page"));
        }
        PassthroughComposer.compose(document, path)
    }
}

struct CounterComposer;

impl PageComposer for CounterComposer {
    fn compose(&self, document: SourceDocument, _path: &Path) -> Result<ComposedPage, CompileError> {
        Ok(ComposedPage {
            document,
            bindings: PageBindings {
                state: vec![StateDeclaration {
                    name: "count".to_string(),
                    initial_value: "0".to_string(),
                }],
                text: vec![Binding::text("expr_0", "state.count")],
                attributes: Vec::new(),
            },
        })
    }
}

#[test]
fn test_every_route_resolves_to_its_emitted_file() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    sample_site(&pages);

    let report = build_site(&config(pages, out.clone()), &PassthroughComposer).unwrap();
    assert!(report.is_success());
    assert_eq!(report.routes.len(), 4);
    assert_eq!(report.emitted.len(), 4);

    let resolver = RouteResolver::new(&out);
    for route in &report.routes {
        let expected = out.join(&route.output_path);
        assert!(expected.is_file(), "{} was not emitted", expected.display());
        assert_eq!(resolver.resolve(&route.pattern), Resolution::Page(expected));
    }
}

#[test]
fn test_emitted_layout() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    sample_site(&pages);

    build_site(&config(pages, out.clone()), &PassthroughComposer).unwrap();

    let home = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(home.contains(r#"<button data-zen-click="increment">+</button>"#));
    assert!(!home.contains("onclick"));
    assert!(!home.contains("<style>"));
    assert!(home.contains(r#"<link rel="stylesheet" href="/style-0.css">"#));
    assert!(home.contains(r#"<script defer src="/script-0.js"></script>"#));

    let home_script = fs::read_to_string(out.join("script-0.js")).unwrap();
    assert!(home_script.contains("function increment() {}"));
    assert!(home_script.contains(r#"const kinds = ["click"];"#));
    assert_eq!(
        fs::read_to_string(out.join("style-0.css")).unwrap(),
        "h1 { color: red; }"
    );

    // Static page: no script shipped.
    let about = fs::read_to_string(out.join("about.html")).unwrap();
    assert!(!about.contains("<script"));
    assert!(!out.join("about/script-0.js").exists());

    // Nested index page keeps its own assets.
    let blog_script = fs::read_to_string(out.join("blog/script-0.js")).unwrap();
    assert!(blog_script.contains("console.log('blog');"));
    assert!(fs::read_to_string(out.join("blog/index.html"))
        .unwrap()
        .contains(r#"src="/blog/script-0.js""#));

    // Full document without scripts gets a synthesized runtime slot.
    let post = fs::read_to_string(out.join("blog/post.html")).unwrap();
    assert!(post.contains(r#"<form data-zen-submit="save">"#));
    assert!(post.contains(r#"<script defer src="/blog/post/script-0.js"></script>"#));
    let post_script = fs::read_to_string(out.join("blog/post/script-0.js")).unwrap();
    assert!(post_script.contains(r#"const kinds = ["input","submit"];"#));
}

#[test]
fn test_rebuild_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    sample_site(&pages);

    let cfg = config(pages, out.clone());
    build_site(&cfg, &CounterComposer).unwrap();
    let first = snapshot(&out);

    fs::write(out.join("stale.html"), "left over").unwrap();
    build_site(&cfg, &CounterComposer).unwrap();
    let second = snapshot(&out);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_parallel_build_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    sample_site(&pages);

    let sequential = dir.path().join("seq");
    let parallel = dir.path().join("par");
    build_site(&config(pages.clone(), sequential.clone()), &PassthroughComposer).unwrap();

    let mut cfg = config(pages, parallel.clone());
    cfg.parallel = true;
    let report = build_site(&cfg, &PassthroughComposer).unwrap();
    assert!(report.is_success());

    assert_eq!(snapshot(&sequential), snapshot(&parallel));
}

#[test]
fn test_failed_page_does_not_stop_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    sample_site(&pages);

    let report = build_site(&config(pages, out.clone()), &FailOn("about.zen")).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].route.pattern, "/about");
    assert_eq!(report.failed[0].error.code(), "Z-ERR-PARSE");
    assert_eq!(report.emitted.len(), 3);

    assert!(!out.join("about.html").exists());
    assert!(out.join("index.html").is_file());
    assert!(out.join("blog/post.html").is_file());
}

#[test]
fn test_colliding_sources_emit_one_page() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    write_pages(
        &pages,
        &[
            ("index.zen", "<h1>Home</h1>"),
            ("docs.zen", "<h1>Docs leaf</h1>"),
            ("docs/index.zen", "<h1>Docs index</h1>"),
        ],
    );

    let report = build_site(&config(pages.clone(), out.clone()), &PassthroughComposer).unwrap();
    assert_eq!(report.routes.len(), 2);
    assert!(report.warnings.contains(&BuildWarning::RouteCollision {
        pattern: "/docs".to_string(),
        kept: pages.join("docs.zen"),
        dropped: pages.join("docs/index.zen"),
    }));

    assert!(out.join("docs.html").is_file());
    assert!(!out.join("docs/index.html").exists());
    assert_eq!(
        RouteResolver::new(&out).resolve("/docs"),
        Resolution::Page(out.join("docs.html"))
    );
}

#[test]
fn test_bindings_run_before_user_script() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    write_pages(
        &pages,
        &[(
            "index.zen",
            r#"<p data-zen-text="expr_0"></p><script>window.__zenith.state.count = 1;</script>"#,
        )],
    );

    build_site(&config(pages, out.clone()), &CounterComposer).unwrap();

    let script = fs::read_to_string(out.join("script-0.js")).unwrap();
    let bindings = script.find("// [ZENITH] text bindings").unwrap();
    let user = script.find("window.__zenith.state.count = 1;").unwrap();
    let events = script.find("// [ZENITH] event dispatch").unwrap();
    assert!(bindings < user);
    assert!(user < events);
}

#[test]
fn test_root_favicon_serves_every_page() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    write_pages(
        &pages,
        &[("index.zen", "<h1>Home</h1>"), ("blog/post.zen", "<h1>Post</h1>")],
    );
    fs::write(pages.join("favicon.ico"), b"ico").unwrap();

    let report = build_site(&config(pages, out.clone()), &PassthroughComposer).unwrap();
    assert!(report.is_success());
    assert!(report.warnings.is_empty());
    assert_eq!(fs::read(out.join("favicon.ico")).unwrap(), b"ico");
}

#[test]
fn test_favicon_choice_is_fixed_across_parallel_builds() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    write_pages(
        &pages,
        &[
            ("index.zen", "<h1>Home</h1>"),
            ("blog/post.zen", "<h1>Post</h1>"),
            ("docs/guide.zen", "<h1>Guide</h1>"),
        ],
    );
    fs::write(pages.join("blog/favicon.ico"), b"blog").unwrap();
    fs::write(pages.join("docs/favicon.ico"), b"docs").unwrap();

    let sequential = dir.path().join("seq");
    build_site(&config(pages.clone(), sequential.clone()), &PassthroughComposer).unwrap();
    // No root favicon: the first route directory that has one wins.
    assert_eq!(fs::read(sequential.join("favicon.ico")).unwrap(), b"blog");

    for round in 0..4 {
        let parallel = dir.path().join(format!("par-{}", round));
        let mut cfg = config(pages.clone(), parallel.clone());
        cfg.parallel = true;
        build_site(&cfg, &PassthroughComposer).unwrap();
        assert_eq!(snapshot(&sequential), snapshot(&parallel));
    }

    fs::write(pages.join("favicon.ico"), b"root").unwrap();
    build_site(&config(pages, sequential.clone()), &PassthroughComposer).unwrap();
    assert_eq!(fs::read(sequential.join("favicon.ico")).unwrap(), b"root");
}

#[test]
fn test_missing_favicon_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    write_pages(&pages, &[("index.zen", "<h1>Home</h1>")]);

    let report = build_site(&config(pages.clone(), out.clone()), &PassthroughComposer).unwrap();
    assert!(report.is_success());
    assert_eq!(
        report.warnings,
        vec![BuildWarning::MissingAsset {
            path: pages.join("favicon.ico")
        }]
    );
    assert!(!out.join("favicon.ico").exists());
}

#[test]
fn test_encoded_request_reaches_page_with_space_in_name() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    write_pages(
        &pages,
        &[("index.zen", "<h1>Home</h1>"), ("my page.zen", "<h1>Spaced</h1>")],
    );

    build_site(&config(pages, out.clone()), &PassthroughComposer).unwrap();
    assert_eq!(
        RouteResolver::new(&out).resolve("/my%20page"),
        Resolution::Page(out.join("my page.html"))
    );
}

#[test]
fn test_base_path_build_is_servable() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    sample_site(&pages);

    let mut cfg = config(pages, out.clone());
    cfg.base_path = "/docs".to_string();
    build_site(&cfg, &PassthroughComposer).unwrap();

    let resolver = RouteResolver::new(&out).with_base_path(&cfg.base_path);
    let reference = Regex::new(r#"(?:src|href)="([^"]+\.(?:js|css))""#).unwrap();

    for page in ["index.html", "blog/index.html", "blog/post.html"] {
        let html = fs::read_to_string(out.join(page)).unwrap();
        let urls: Vec<&str> = reference
            .captures_iter(&html)
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert!(!urls.is_empty(), "{} links no assets", page);

        for url in urls {
            assert!(url.starts_with("/docs/"), "{} is not under the base", url);
            match resolver.resolve(url) {
                Resolution::Asset(path) => assert!(path.is_file(), "{} is missing", url),
                other => panic!("{} resolved to {:?}", url, other),
            }
        }
    }

    assert_eq!(
        resolver.resolve("/docs/blog/post"),
        Resolution::Page(out.join("blog/post.html"))
    );
}

#[test]
fn test_commented_head_close_keeps_assets_outside_comment() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    write_pages(
        &pages,
        &[(
            "index.zen",
            r#"<!-- layout ends </head> here --><button onclick="go">x</button><script>function go() {}</script>"#,
        )],
    );

    build_site(&config(pages, out.clone()), &PassthroughComposer).unwrap();

    let html = fs::read_to_string(out.join("index.html")).unwrap();
    let comment = html.find("<!-- layout ends </head> here -->").unwrap();
    let script = html.find(r#"<script defer src="/script-0.js"></script>"#).unwrap();
    assert!(script < comment);
    assert!(html.contains(r#"<button data-zen-click="go">x</button>"#));
}

#[test]
fn test_fragment_title_lands_in_head() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    let out = dir.path().join("dist");
    write_pages(&pages, &[("index.zen", "<title>Home</title><h1>Home</h1>")]);

    build_site(&config(pages, out.clone()), &PassthroughComposer).unwrap();

    let html = fs::read_to_string(out.join("index.html")).unwrap();
    let head_end = html.find("</head>").unwrap();
    let title = html.find("<title>Home</title>").unwrap();
    assert!(title < head_end);
    assert!(html.contains("<body>\n<h1>Home</h1>\n</body>"));
}

#[test]
fn test_missing_pages_dir_builds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("dist");
    let report = build_site(
        &config(dir.path().join("nope"), out.clone()),
        &PassthroughComposer,
    )
    .unwrap();
    assert!(report.routes.is_empty());
    assert!(out.is_dir());
}
