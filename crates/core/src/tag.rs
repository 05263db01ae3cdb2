//! 태그: `카테고리/이름` 형식의 분류 라벨

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 리소스에 붙이는 태그
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// 태그 카테고리 (예: `Department`)
    pub category: String,
    /// 태그 이름 (예: `Engineering`)
    pub name: String,
}

impl Tag {
    /// 새 태그를 생성합니다.
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// 태그 문자열 파싱 실패
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tag '{0}': expected 'Category/Name'")]
pub struct TagParseError(pub String);

impl FromStr for Tag {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, name) = s
            .split_once('/')
            .ok_or_else(|| TagParseError(s.to_owned()))?;
        let category = category.trim();
        let name = name.trim();
        if category.is_empty() || name.is_empty() {
            return Err(TagParseError(s.to_owned()));
        }
        Ok(Self::new(category, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let tag: Tag = "Department/Engineering".parse().unwrap();
        assert_eq!(tag.category, "Department");
        assert_eq!(tag.name, "Engineering");
        assert_eq!(tag.to_string(), "Department/Engineering");
    }

    #[test]
    fn parse_trims_whitespace() {
        let tag: Tag = " Location / Brno ".parse().unwrap();
        assert_eq!(tag, Tag::new("Location", "Brno"));
    }

    #[test]
    fn parse_rejects_missing_separator_or_parts() {
        assert!("Department".parse::<Tag>().is_err());
        assert!("/Engineering".parse::<Tag>().is_err());
        assert!("Department/".parse::<Tag>().is_err());
    }

    #[test]
    fn name_may_contain_slash() {
        let tag: Tag = "Environment/QA/Staging".parse().unwrap();
        assert_eq!(tag.category, "Environment");
        assert_eq!(tag.name, "QA/Staging");
    }
}
