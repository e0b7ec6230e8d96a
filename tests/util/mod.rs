use blog_search::config::SearchConfig;
use std::fmt::Write as _;
use std::path::PathBuf;
use tempfile::TempDir;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A blog post rendered in the scraper's file format.
#[derive(Debug, Clone, Default)]
pub struct Post {
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
    category: Option<String>,
    url: Option<String>,
    body: String,
}

#[allow(dead_code)]
impl Post {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let fields = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Date", &self.date),
            ("Category", &self.category),
            ("URL", &self.url),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                let _ = writeln!(out, "{key}: {value}");
            }
        }
        out.push_str(&"=".repeat(50));
        out.push('\n');
        out.push_str(&self.body);
        out
    }
}

/// Temporary model file plus document directory.
#[allow(dead_code)]
pub struct BlogFixture {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl BlogFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir(dir.path().join("blogs")).expect("create blogs dir");
        Self { dir }
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.path().join("vectors.txt")
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.dir.path().join("blogs")
    }

    /// Write a word2vec text table with a `<count> <dim>` header.
    pub fn write_model(&self, entries: &[(&str, &[f32])]) -> &Self {
        let dim = entries.first().map_or(0, |(_, v)| v.len());
        let mut out = format!("{} {dim}\n", entries.len());
        for (word, vector) in entries {
            let values: Vec<String> = vector.iter().map(|x| x.to_string()).collect();
            let _ = writeln!(out, "{word} {}", values.join(" "));
        }
        std::fs::write(self.model_path(), out).expect("write model");
        self
    }

    pub fn write_post(&self, name: &str, post: &Post) -> &Self {
        self.write_raw(name, post.render().as_bytes())
    }

    pub fn write_raw(&self, name: &str, bytes: &[u8]) -> &Self {
        std::fs::write(self.docs_dir().join(name), bytes).expect("write post");
        self
    }

    pub fn config(&self) -> SearchConfig {
        SearchConfig {
            model_path: self.model_path(),
            docs_dir: self.docs_dir(),
            ..SearchConfig::default()
        }
    }
}

/// Vocabulary with a technology cluster and a food cluster.
#[allow(dead_code)]
pub const SCENARIO_VOCAB: [(&str, &[f32]); 6] = [
    ("technology", &[0.9, 0.1, 0.0]),
    ("innovation", &[0.8, 0.2, 0.1]),
    ("education", &[0.7, 0.3, 0.0]),
    ("cooking", &[0.1, 0.9, 0.2]),
    ("recipes", &[0.0, 0.8, 0.3]),
    ("food", &[0.1, 0.7, 0.4]),
];

/// Three posts: technology, cooking, and one with no text at all.
#[allow(dead_code)]
pub fn three_post_fixture() -> BlogFixture {
    let fixture = BlogFixture::new();
    fixture
        .write_model(&SCENARIO_VOCAB)
        .write_post(
            "a.txt",
            &Post::new("technology and innovation in education")
                .author("Ada")
                .category("Tech")
                .url("https://example.org/a"),
        )
        .write_post("b.txt", &Post::new("cooking recipes and food").author("Bo"))
        .write_post("c.txt", &Post::new(""));
    fixture
}
