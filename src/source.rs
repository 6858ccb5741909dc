use std::fs::OpenOptions;
use std::io::{BufRead as _, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use url::Url;

use crate::formats::{ModuleDetail, ModuleId, ModuleRecord};

#[async_trait]
pub trait ModuleSource: Send + Sync {
    async fn fetch_course_modules(&self, course_id: &str) -> anyhow::Result<Vec<ModuleRecord>>;
    async fn fetch_module_detail(&self, module_id: &ModuleId) -> anyhow::Result<ModuleDetail>;
}

#[derive(Debug, Clone)]
pub struct FileModuleSource {
    path: PathBuf,
    records: Vec<ModuleRecord>,
}

impl FileModuleSource {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let records = read_module_records(&path)?;
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[ModuleRecord] {
        &self.records
    }
}

#[async_trait]
impl ModuleSource for FileModuleSource {
    async fn fetch_course_modules(&self, course_id: &str) -> anyhow::Result<Vec<ModuleRecord>> {
        tracing::debug!(
            course_id,
            path = %self.path.display(),
            modules = self.records.len(),
            "serving course modules from file"
        );
        Ok(self.records.clone())
    }

    async fn fetch_module_detail(&self, module_id: &ModuleId) -> anyhow::Result<ModuleDetail> {
        self.records
            .iter()
            .find(|r| &r.id == module_id)
            .map(ModuleDetail::from)
            .ok_or_else(|| {
                anyhow::anyhow!("module not found: {module_id} ({})", self.path.display())
            })
    }
}

pub fn read_module_records(path: &Path) -> anyhow::Result<Vec<ModuleRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jsonl") => read_jsonl_records(path),
        Some("yaml" | "yml") => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("read modules: {}", path.display()))?;
            serde_yaml::from_str(&contents)
                .with_context(|| format!("parse modules yaml: {}", path.display()))
        }
        Some("json") | None => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("read modules: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parse modules json: {}", path.display()))
        }
        Some(other) => anyhow::bail!(
            "unsupported modules file extension `{other}`: {}",
            path.display()
        ),
    }
}

fn read_jsonl_records(path: &Path) -> anyhow::Result<Vec<ModuleRecord>> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("open modules: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("read modules jsonl line")?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ModuleRecord = serde_json::from_str(&line)
            .with_context(|| format!("parse module record on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[derive(Debug, Clone)]
pub struct HttpModuleSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpModuleSource {
    pub fn new(base_url: Url, timeout: Duration) -> anyhow::Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("base url cannot be a base: {base_url}");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("base url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> anyhow::Result<T> {
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("send request: {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("request failed ({status}): {url}: {body}");
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("parse response json: {url}"))
    }
}

#[async_trait]
impl ModuleSource for HttpModuleSource {
    async fn fetch_course_modules(&self, course_id: &str) -> anyhow::Result<Vec<ModuleRecord>> {
        let url = self.endpoint(&["courses", course_id, "modules"])?;
        let records: Vec<ModuleRecord> = self.get_json(url).await.context("fetch course modules")?;
        tracing::info!(course_id, modules = records.len(), "fetched course modules");
        Ok(records)
    }

    async fn fetch_module_detail(&self, module_id: &ModuleId) -> anyhow::Result<ModuleDetail> {
        let url = self.endpoint(&["modules", module_id.as_str()])?;
        self.get_json(url)
            .await
            .with_context(|| format!("fetch module detail: {module_id}"))
    }
}
