use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ModuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for ModuleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderType {
    Chapter,
    Section,
    Lesson,
}

impl HeaderType {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "chapter" => Ok(Self::Chapter),
            "section" => Ok(Self::Section),
            "lesson" => Ok(Self::Lesson),
            other => anyhow::bail!("unsupported header type: {other}"),
        }
    }
}

impl<'de> Deserialize<'de> for HeaderType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Chapter => "chapter",
            Self::Section => "section",
            Self::Lesson => "lesson",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: ModuleId,
    pub header_type: HeaderType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl ModuleRecord {
    pub fn new(id: impl Into<ModuleId>, header_type: HeaderType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header_type,
            title: title.into(),
            video_url: None,
            description: None,
            duration: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDetail {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub title: String,
    pub header_type: HeaderType,
}

impl From<&ModuleRecord> for ModuleDetail {
    fn from(record: &ModuleRecord) -> Self {
        Self {
            video_url: record.video_url.clone(),
            description: record.description.clone(),
            title: record.title.clone(),
            header_type: record.header_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    #[serde(flatten)]
    pub record: ModuleRecord,
    pub chapter_index: usize,
    pub sections: Vec<Section>,
    pub direct_lessons: Vec<Lesson>,
    pub is_expanded: bool,
}

impl Chapter {
    pub fn has_children(&self) -> bool {
        !self.sections.is_empty() || !self.direct_lessons.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.sections.len()
            + self.direct_lessons.len()
            + self.sections.iter().map(|s| s.lessons.len()).sum::<usize>()
    }

    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.direct_lessons
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.lessons.iter()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    #[serde(flatten)]
    pub record: ModuleRecord,
    pub lessons: Vec<Lesson>,
    pub is_expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lesson {
    #[serde(flatten)]
    pub record: ModuleRecord,
    pub lesson_index: usize,
    pub global_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}
