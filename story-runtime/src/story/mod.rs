//! # Story 模块
//!
//! 故事书：按顺序排列的页面定义，可以从 JSON 加载，也可以使用内置的故事。

mod hackathon;
mod page;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::StoryDataError;

pub use page::{NarrationCue, PageId, PageSpec, StepId};

/// 故事书
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storybook {
    #[serde(default)]
    pub title: String,
    pub pages: Vec<PageSpec>,
}

impl Storybook {
    pub fn new(title: impl Into<String>, pages: Vec<PageSpec>) -> Self {
        Self {
            title: title.into(),
            pages,
        }
    }

    /// 内置的五页黑客松故事
    pub fn hackathon() -> Self {
        hackathon::book()
    }

    /// 从 JSON 文本解析并验证
    pub fn from_json(json: &str) -> Result<Self, StoryDataError> {
        let book: Self =
            serde_json::from_str(json).map_err(|e| StoryDataError::Parse(e.to_string()))?;
        book.validate()?;
        Ok(book)
    }

    /// 从文件加载并验证
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoryDataError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| StoryDataError::Io(format!("{:?}: {}", path.as_ref(), e)))?;
        Self::from_json(&content)
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> Result<String, StoryDataError> {
        serde_json::to_string_pretty(self).map_err(|e| StoryDataError::Parse(e.to_string()))
    }

    /// 验证所有页面
    pub fn validate(&self) -> Result<(), StoryDataError> {
        if self.pages.is_empty() {
            return Err(StoryDataError::NoPages);
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(&page.id) {
                return Err(StoryDataError::DuplicatePage(page.id.clone()));
            }
            page.validate()?;
        }
        Ok(())
    }

    pub fn page(&self, index: usize) -> Option<&PageSpec> {
        self.pages.get(index)
    }

    pub fn index_of(&self, id: &PageId) -> Option<usize> {
        self.pages.iter().position(|page| &page.id == id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
