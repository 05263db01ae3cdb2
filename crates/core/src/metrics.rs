//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다. 익스포터는 설치하지 않으며,
//! 레코더가 없으면 매크로는 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `crudcheck_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(
//!     crudcheck_core::metrics::REMOTE_CALLS_TOTAL,
//!     crudcheck_core::metrics::LABEL_OPERATION => "update",
//! )
//! .increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 원격 동작 레이블 키 (create, read, update, delete, exists, ...)
pub const LABEL_OPERATION: &str = "operation";

/// 리소스 종류 레이블 키 (key_pair, report, dashboard, ...)
pub const LABEL_KIND: &str = "kind";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── 원격 호출 메트릭 ───────────────────────────────────────────────

/// 원격 호출 수 (counter, label: operation, kind, result)
pub const REMOTE_CALLS_TOTAL: &str = "crudcheck_remote_calls_total";

/// 원격 호출 지연 시간 (histogram, 초, label: operation)
pub const REMOTE_CALL_DURATION_SECONDS: &str = "crudcheck_remote_call_duration_seconds";

/// 원격 호출 타임아웃 수 (counter, label: operation)
pub const REMOTE_TIMEOUTS_TOTAL: &str = "crudcheck_remote_timeouts_total";

// ─── 업데이트 세션 메트릭 ───────────────────────────────────────────

/// 반영이 확인된 커밋 수 (counter, label: kind)
pub const UPDATES_COMMITTED_TOTAL: &str = "crudcheck_updates_committed_total";

/// 변경 없이 끝난 세션 수 (counter, label: kind)
pub const UPDATES_UNCHANGED_TOTAL: &str = "crudcheck_updates_unchanged_total";

/// 실패한 커밋 수: 거부 또는 미확인 (counter, label: kind)
pub const UPDATES_FAILED_TOTAL: &str = "crudcheck_updates_failed_total";

// ─── 픽스처 메트릭 ─────────────────────────────────────────────────

/// 픽스처 정리(삭제) 수 (counter, label: kind, result)
pub const TEARDOWNS_TOTAL: &str = "crudcheck_teardowns_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 후 한 번 호출합니다. 레코더가 없어도 안전합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        REMOTE_CALLS_TOTAL,
        "Remote calls made to the appliance by operation, kind, and result"
    );
    describe_histogram!(
        REMOTE_CALL_DURATION_SECONDS,
        "Remote call latency in seconds"
    );
    describe_counter!(
        REMOTE_TIMEOUTS_TOTAL,
        "Remote calls that exceeded the operation timeout"
    );

    describe_counter!(
        UPDATES_COMMITTED_TOTAL,
        "Update sessions whose changes were applied and confirmed"
    );
    describe_counter!(
        UPDATES_UNCHANGED_TOTAL,
        "Update sessions that ended without any field change"
    );
    describe_counter!(
        UPDATES_FAILED_TOTAL,
        "Update sessions that were rejected or left unconfirmed"
    );

    describe_counter!(TEARDOWNS_TOTAL, "Fixture teardown deletions by result");
}
