//! Integration tests for the document pipeline and build driver.
//!
//! Each test lays out a content tree and a templates tree in a temporary
//! directory and checks the rendered output tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use quill_site::{
    BuildDriver, BuildError, BuildOptions, DocumentError, DocumentPipeline, FnHooks, Phase,
    PipelineConfig, SetupError, TemplateError,
};
use quill_templates::{CompiledTemplate, HandlebarsCompiler, TemplateCompiler};
use static_assertions::assert_impl_all;
use tempfile::TempDir;

assert_impl_all!(DocumentPipeline: Send, Sync);
assert_impl_all!(BuildDriver: Send, Sync);

struct Site {
    temp: TempDir,
}

impl Site {
    fn new() -> Self {
        let site = Self {
            temp: TempDir::new().unwrap(),
        };
        fs::create_dir_all(site.content()).unwrap();
        fs::create_dir_all(site.templates()).unwrap();
        site
    }

    fn content(&self) -> PathBuf {
        self.temp.path().join("content")
    }

    fn templates(&self) -> PathBuf {
        self.temp.path().join("templates")
    }

    fn dist(&self) -> PathBuf {
        self.temp.path().join("dist")
    }

    fn write(&self, path: PathBuf, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn page(&self, relative: &str, text: &str) {
        self.write(self.content().join(relative), text);
    }

    fn template(&self, relative: &str, text: &str) {
        self.write(self.templates().join(relative), text);
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig::new(self.templates()).with_layout("default", "default.hbs")
    }

    fn options(&self) -> BuildOptions {
        BuildOptions::new(self.content(), self.dist())
    }

    fn output(&self, relative: &str) -> String {
        fs::read_to_string(self.dist().join(relative)).unwrap()
    }
}

struct CountingCompiler(Arc<AtomicUsize>);

impl TemplateCompiler for CountingCompiler {
    fn compile(&self, path: &Path, source: &str) -> Result<CompiledTemplate, TemplateError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        HandlebarsCompiler.compile(path, source)
    }
}

#[test]
fn test_title_and_body_render_through_layout() {
    let site = Site::new();
    site.template("default.hbs", "<h1>{{title}}</h1>{{{body}}}");
    site.page("index.md", "---\ntitle: Hi\n---\n# Hello\n");

    let pipeline = DocumentPipeline::new(site.config()).unwrap();
    let report = BuildDriver::new(pipeline, site.options()).build().unwrap();

    assert!(report.is_success());
    assert_eq!(
        site.output("index.html"),
        r##"<h1>Hi</h1><h1 id="hello" tabindex="-1">Hello <a class="header-anchor" href="#hello" aria-hidden="true">⚭</a></h1>"##
    );
}

#[test]
fn test_layout_compiles_once_for_many_documents() {
    let site = Site::new();
    site.template("default.hbs", "{{title}}:{{{body}}}{{partial \"footer\"}}");
    site.template("footer.hbs", "<footer>{{site.name}}</footer>");
    for i in 0..100 {
        site.page(&format!("page-{i:03}.md"), &format!("---\ntitle: P{i}\n---\nx"));
    }

    let count = Arc::new(AtomicUsize::new(0));
    let config = site.config().with_site(serde_json::json!({"name": "Docs"}));
    let pipeline =
        DocumentPipeline::with_compiler(config, CountingCompiler(Arc::clone(&count))).unwrap();
    let report = BuildDriver::new(pipeline, site.options()).build().unwrap();

    assert_eq!(report.written.len(), 100);
    // One compile for the layout, one for the partial.
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(
        site.output("page-042.html"),
        "P42:<p>x</p><footer>Docs</footer>"
    );
}

#[test]
fn test_partials_resolve_relative_to_layout_directory() {
    let site = Site::new();
    site.template("default.hbs", "default");
    site.template("a/page.hbs", "{{partial \"nav\"}}");
    site.template("a/nav.hbs", "a-nav");
    site.template("b/page.hbs", "{{partial \"nav\"}}");
    site.template("b/nav.handlebars", "b-nav");
    site.page("one.md", "---\nlayout: a\n---\n");
    site.page("two.md", "---\nlayout: b\n---\n");

    let config = site
        .config()
        .with_layout("a", "a/page.hbs")
        .with_layout("b", "b/page.hbs");
    let pipeline = DocumentPipeline::new(config).unwrap();
    BuildDriver::new(pipeline, site.options()).build().unwrap();

    assert_eq!(site.output("one.html"), "a-nav");
    assert_eq!(site.output("two.html"), "b-nav");
}

#[test]
fn test_missing_default_layout_fails_before_reading_documents() {
    let site = Site::new();
    site.page("index.md", "x");

    let err = DocumentPipeline::new(PipelineConfig::new(site.templates())).unwrap_err();
    assert!(matches!(err, SetupError::MissingDefaultLayout));

    let err = DocumentPipeline::new(site.config()).unwrap_err();
    assert!(matches!(err, SetupError::DefaultLayoutNotFound(_)));
    assert!(!site.dist().exists());
}

#[test]
fn test_unknown_layout_fails_only_that_document() {
    let site = Site::new();
    site.template("default.hbs", "{{{body}}}");
    site.page("a.md", "first");
    site.page("b.md", "---\nlayout: blog\n---\nsecond");
    site.page("c.md", "third");

    let pipeline = DocumentPipeline::new(site.config()).unwrap();
    let report = BuildDriver::new(pipeline, site.options()).build().unwrap();

    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.path(), Path::new("b.md"));
    assert_eq!(failure.phase(), Phase::ResolveLayout);
    match failure.template_error() {
        Some(TemplateError::LayoutNotFound { name, path }) => {
            assert_eq!(name, "blog");
            assert_eq!(path, &site.templates().join("blog.hbs"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(site.output("a.html"), "<p>first</p>");
    assert_eq!(site.output("c.html"), "<p>third</p>");
    assert!(!site.dist().join("b.html").exists());
}

#[test]
fn test_hooks_fire_once_each_in_order() {
    let site = Site::new();
    site.template("default.hbs", "{{{body}}}");
    site.page("index.md", "x");

    let calls = Arc::new(Mutex::new(Vec::new()));
    let record = |name: &'static str| {
        let calls = Arc::clone(&calls);
        move || calls.lock().unwrap().push(name)
    };
    let (before_markdown, after_markdown, before_compile, after_compile) = (
        record("before_markdown"),
        record("after_markdown"),
        record("before_compile"),
        record("after_compile"),
    );
    let hooks = FnHooks::new()
        .on_before_markdown(move |_| {
            before_markdown();
            Ok(())
        })
        .on_after_markdown(move |_| {
            after_markdown();
            Ok(())
        })
        .on_before_compile(move |_| {
            before_compile();
            Ok(())
        })
        .on_after_compile(move |_, _| {
            after_compile();
            Ok(None)
        });

    let pipeline = DocumentPipeline::new(site.config()).unwrap().with_hooks(hooks);
    BuildDriver::new(pipeline, site.options()).build().unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        [
            "before_markdown",
            "after_markdown",
            "before_compile",
            "after_compile"
        ]
    );
    assert_eq!(site.output("index.html"), "<p>x</p>");
}

#[test]
fn test_hook_failure_fails_only_that_document() {
    let site = Site::new();
    site.template("default.hbs", "{{{body}}}");
    site.page("a.md", "first");
    site.page("b.md", "---\ndraft: true\n---\nsecond");
    site.page("c.md", "third");

    let hooks = FnHooks::new().on_before_compile(|doc| {
        if doc.attributes.get("draft") == Some(&serde_json::Value::Bool(true)) {
            return Err("drafts are not published".into());
        }
        Ok(())
    });
    let pipeline = DocumentPipeline::new(site.config()).unwrap().with_hooks(hooks);
    let report = BuildDriver::new(pipeline, site.options()).build().unwrap();

    assert!(!report.is_success());
    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.path(), Path::new("b.md"));
    assert_eq!(failure.phase(), Phase::BeforeCompile);
    match failure {
        DocumentError::Hook { source, .. } => {
            assert_eq!(source.to_string(), "drafts are not published");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(site.output("a.html"), "<p>first</p>");
    assert_eq!(site.output("c.html"), "<p>third</p>");
    assert!(!site.dist().join("b.html").exists());
}

#[test]
fn test_directories_are_mirrored() {
    let site = Site::new();
    site.template("default.hbs", "{{outputFile}}");
    site.page("guide/intro.markdown", "x");
    site.page("guide/deep/page.md", "x");
    site.page("guide/image.png", "not a document");
    fs::create_dir_all(site.content().join("empty")).unwrap();

    let pipeline = DocumentPipeline::new(site.config()).unwrap();
    let report = BuildDriver::new(pipeline, site.options()).build().unwrap();

    assert_eq!(
        report.directories,
        [
            PathBuf::from("empty"),
            PathBuf::from("guide"),
            PathBuf::from("guide/deep"),
        ]
    );
    assert!(site.dist().join("empty").is_dir());
    assert!(!site.dist().join("guide/image.png").exists());
    assert_eq!(site.output("guide/intro.html"), "guide/intro.html");
    assert_eq!(site.output("guide/deep/page.html"), "guide/deep/page.html");
    assert_eq!(
        report.size_lines(),
        ["20B\tguide/deep/page.html", "16B\tguide/intro.html"]
    );
}

#[test]
fn test_rebuild_overwrites_output() {
    let site = Site::new();
    site.template("default.hbs", "{{{body}}}");
    site.page("index.md", "one");

    let pipeline = DocumentPipeline::new(site.config()).unwrap();
    let driver = BuildDriver::new(pipeline, site.options());
    driver.build().unwrap();
    site.page("index.md", "two");
    driver.build().unwrap();

    assert_eq!(site.output("index.html"), "<p>two</p>");
}

#[test]
fn test_fail_fast_stops_at_first_failure() {
    let site = Site::new();
    site.template("default.hbs", "{{{body}}}");
    site.page("a.md", "---\ntitle: [\n---\n");
    site.page("b.md", "fine");

    let pipeline = DocumentPipeline::new(site.config()).unwrap();
    let mut options = site.options();
    options.fail_fast = true;
    let err = BuildDriver::new(pipeline, options).build().unwrap_err();

    match err {
        BuildError::FailFast(DocumentError::MalformedFrontMatter { path, .. }) => {
            assert_eq!(path, PathBuf::from("a.md"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!site.dist().join("b.html").exists());
}

#[test]
fn test_missing_source_directory() {
    let site = Site::new();
    site.template("default.hbs", "");
    let pipeline = DocumentPipeline::new(site.config()).unwrap();
    let options = BuildOptions::new(site.temp.path().join("nope"), site.dist());

    let err = BuildDriver::new(pipeline, options).build().unwrap_err();
    assert!(matches!(err, BuildError::SourceNotFound(_)));
}

#[test]
fn test_custom_target_extension() {
    let site = Site::new();
    site.template("default.hbs", "{{{body}}}");
    site.page("feed.md", "x");

    let mut config = site.config();
    config.target_extension = "xml".to_owned();
    let pipeline = DocumentPipeline::new(config).unwrap();
    let report = BuildDriver::new(pipeline, site.options()).build().unwrap();

    assert_eq!(report.written[0].output, PathBuf::from("feed.xml"));
    assert_eq!(site.output("feed.xml"), "<p>x</p>");
}
