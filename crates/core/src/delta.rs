//! 업데이트 델타: 스냅샷과 현재 상태의 차이
//!
//! [`UpdateDelta`]는 값이 달라진 필드만 담습니다. 원격 업데이트에는
//! 객체 전체가 아니라 이 델타만 전송됩니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::FieldSet;
use crate::error::FieldMismatch;

/// 단일 필드의 변경 (이전 값, 새 값)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// 스냅샷 시점의 값
    pub old: serde_json::Value,
    /// 스코프 종료 시점의 값
    pub new: serde_json::Value,
}

/// 필드명 → 변경 맵
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDelta {
    changes: BTreeMap<String, FieldChange>,
}

impl UpdateDelta {
    /// 두 필드 맵의 차이를 계산합니다.
    ///
    /// 한쪽에만 있는 필드는 반대쪽 값을 `null`로 보고 비교합니다.
    pub fn between(before: &FieldSet, after: &FieldSet) -> Self {
        let mut changes = BTreeMap::new();

        for (field, old) in before {
            let new = after.get(field).unwrap_or(&serde_json::Value::Null);
            if old != new {
                changes.insert(
                    field.clone(),
                    FieldChange {
                        old: old.clone(),
                        new: new.clone(),
                    },
                );
            }
        }

        for (field, new) in after {
            if !before.contains_key(field) && !new.is_null() {
                changes.insert(
                    field.clone(),
                    FieldChange {
                        old: serde_json::Value::Null,
                        new: new.clone(),
                    },
                );
            }
        }

        Self { changes }
    }

    /// 단일 변경을 추가합니다.
    pub fn insert(&mut self, field: impl Into<String>, change: FieldChange) {
        self.changes.insert(field.into(), change);
    }

    /// 변경이 없으면 `true`
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// 변경된 필드 수
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// 변경된 필드명 목록 (정렬됨)
    pub fn fields(&self) -> Vec<&str> {
        self.changes.keys().map(String::as_str).collect()
    }

    /// 특정 필드의 변경을 조회합니다.
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.get(field)
    }

    /// 변경 목록을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.changes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 새 값만 담은 필드 맵 (부분 업데이트 본문)
    pub fn new_values(&self) -> FieldSet {
        self.changes
            .iter()
            .map(|(k, change)| (k.clone(), change.new.clone()))
            .collect()
    }

    /// 모든 새 값을 필드 맵에 씁니다.
    pub fn apply_to(&self, fields: &mut FieldSet) {
        for (field, change) in &self.changes {
            fields.insert(field.clone(), change.new.clone());
        }
    }

    /// 필드 맵이 모든 새 값을 반영하는지 확인합니다.
    ///
    /// 반영되지 않은 필드마다 [`FieldMismatch`]를 반환합니다.
    pub fn verify(&self, fields: &FieldSet) -> Vec<FieldMismatch> {
        self.changes
            .iter()
            .filter_map(|(field, change)| {
                let actual = fields.get(field).unwrap_or(&serde_json::Value::Null);
                (actual != &change.new).then(|| FieldMismatch {
                    field: field.clone(),
                    expected: change.new.clone(),
                    actual: actual.clone(),
                })
            })
            .collect()
    }
}
