//! 원격 호출 기록

use std::fmt;

use serde::Serialize;

use crudcheck_core::entity::EntityKind;

/// 기록된 단일 호출
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    /// 동작 이름 (create, read, update, ...)
    pub operation: String,
    /// 대상 종류 (ping, tag_catalog은 없음)
    pub kind: Option<EntityKind>,
    /// 대상 이름
    pub name: String,
    /// update가 전달한 필드 목록 (그 외 동작은 비어 있음)
    pub fields: Vec<String>,
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{} {} \"{}\"", self.operation, kind.label(), self.name)?,
            None => write!(f, "{}", self.operation)?,
        }
        if !self.fields.is_empty() {
            write!(f, " [{}]", self.fields.join(","))?;
        }
        Ok(())
    }
}

/// 호출 기록 목록
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    records: Vec<CallRecord>,
}

impl CallLog {
    pub(crate) fn push(&mut self, record: CallRecord) {
        self.records.push(record);
    }

    /// 모든 기록
    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    /// 특정 동작의 호출 수
    pub fn count(&self, operation: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    /// 특정 리소스에 대한 특정 동작의 호출 수
    pub fn count_for(&self, operation: &str, kind: EntityKind, name: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.operation == operation && r.kind == Some(kind) && r.name == name)
            .count()
    }

    /// 특정 리소스로 전달된 update 필드 목록들
    pub fn updates_for(&self, kind: EntityKind, name: &str) -> Vec<Vec<String>> {
        self.records
            .iter()
            .filter(|r| r.operation == "update" && r.kind == Some(kind) && r.name == name)
            .map(|r| r.fields.clone())
            .collect()
    }

    /// 기록을 비웁니다.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(operation: &str, name: &str, fields: &[&str]) -> CallRecord {
        CallRecord {
            operation: operation.to_owned(),
            kind: Some(EntityKind::Schedule),
            name: name.to_owned(),
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
        }
    }

    #[test]
    fn counts_by_operation_and_target() {
        let mut log = CallLog::default();
        log.push(record("create", "s1", &[]));
        log.push(record("update", "s1", &["description"]));
        log.push(record("update", "s2", &["active"]));

        assert_eq!(log.count("update"), 2);
        assert_eq!(log.count_for("update", EntityKind::Schedule, "s1"), 1);
        assert_eq!(
            log.updates_for(EntityKind::Schedule, "s2"),
            vec![vec!["active".to_owned()]]
        );
        log.clear();
        assert!(log.records().is_empty());
    }

    #[test]
    fn display_includes_fields() {
        assert_eq!(
            record("update", "s1", &["active", "timer"]).to_string(),
            "update schedule \"s1\" [active,timer]"
        );
    }
}
