//! 테스트 데이터 프로바이더: 데이터 기반 시나리오의 입력
//!
//! [`TestDataProvider`]는 ID가 붙은 케이스 목록을 제공합니다. 기본 구현인
//! [`StaticProvider`]는 값 목록이나 설정 파일의 느슨한 JSON/TOML 값에서
//! 만들어집니다.

use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::error::DataError;

/// ID가 붙은 단일 테스트 케이스
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase<T> {
    /// 케이스 ID (리포트 이름 등에 사용)
    pub id: String,
    /// 케이스 데이터
    pub data: T,
}

/// 테스트 케이스 공급자
pub trait TestDataProvider<T>: Send + Sync {
    /// 프로바이더 이름
    fn name(&self) -> &str;

    /// 모든 케이스
    fn cases(&self) -> Result<Vec<TestCase<T>>, DataError>;
}

/// 메모리에 고정된 케이스 목록
#[derive(Debug, Clone)]
pub struct StaticProvider<T> {
    name: String,
    cases: Vec<TestCase<T>>,
}

impl<T> StaticProvider<T> {
    /// 빈 프로바이더를 생성합니다.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    /// 케이스를 추가합니다.
    ///
    /// # Errors
    ///
    /// 같은 ID가 이미 있으면 [`DataError::DuplicateId`]
    pub fn with_case(mut self, id: impl Into<String>, data: T) -> Result<Self, DataError> {
        let id = id.into();
        if self.cases.iter().any(|case| case.id == id) {
            return Err(DataError::DuplicateId(id));
        }
        self.cases.push(TestCase { id, data });
        Ok(self)
    }

    /// 케이스 수
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// 케이스가 없으면 `true`
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl<T: DeserializeOwned> StaticProvider<T> {
    /// 느슨한 값 목록을 `T`로 역직렬화해 프로바이더를 만듭니다.
    ///
    /// 각 값의 `id_field` 문자열이 케이스 ID가 되며, 없으면 `case-<번호>`를
    /// 사용합니다.
    pub fn from_values(
        name: impl Into<String>,
        values: &[serde_json::Value],
        id_field: &str,
    ) -> Result<Self, DataError> {
        let mut seen = HashSet::new();
        let mut cases = Vec::with_capacity(values.len());

        for (index, value) in values.iter().enumerate() {
            let id = value
                .get(id_field)
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| format!("case-{}", index + 1), str::to_owned);

            if !seen.insert(id.clone()) {
                return Err(DataError::DuplicateId(id));
            }

            let data = T::deserialize(value).map_err(|e| DataError::InvalidCase {
                id: id.clone(),
                reason: e.to_string(),
            })?;
            cases.push(TestCase { id, data });
        }

        Ok(Self {
            name: name.into(),
            cases,
        })
    }
}

impl<T: Clone + Send + Sync> TestDataProvider<T> for StaticProvider<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn cases(&self) -> Result<Vec<TestCase<T>>, DataError> {
        Ok(self.cases.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Params {
        menu_name: String,
        #[serde(default)]
        rows: u32,
    }

    #[test]
    fn with_case_rejects_duplicate_ids() {
        let provider = StaticProvider::new("numbers").with_case("a", 1).unwrap();
        let err = provider.with_case("a", 2).unwrap_err();
        assert!(matches!(err, DataError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn from_values_uses_id_field() {
        let values = vec![
            json!({"menu_name": "first", "rows": 5}),
            json!({"menu_name": "second"}),
        ];
        let provider = StaticProvider::<Params>::from_values("reports", &values, "menu_name")
            .unwrap();
        let cases = provider.cases().unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, "first");
        assert_eq!(cases[0].data.rows, 5);
        assert_eq!(cases[1].data.rows, 0);
        assert_eq!(provider.name(), "reports");
    }

    #[test]
    fn from_values_falls_back_to_index_ids() {
        let values = vec![json!({"menu_name": 3})];
        let err = StaticProvider::<Params>::from_values("reports", &values, "missing")
            .unwrap_err();
        match err {
            DataError::InvalidCase { id, .. } => assert_eq!(id, "case-1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_values_rejects_duplicate_ids() {
        let values = vec![json!({"menu_name": "x"}), json!({"menu_name": "x"})];
        assert!(matches!(
            StaticProvider::<Params>::from_values("reports", &values, "menu_name"),
            Err(DataError::DuplicateId(_))
        ));
    }

    #[test]
    fn empty_provider_has_no_cases() {
        let provider = StaticProvider::<Params>::new("empty");
        assert!(provider.is_empty());
        assert!(provider.cases().unwrap().is_empty());
    }
}
