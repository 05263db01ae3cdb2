//! 픽스처: 생성한 엔티티를 스코프가 끝날 때 반드시 정리
//!
//! [`Fixture::scoped`]는 엔티티를 생성하고 본문을 실행한 뒤, 본문이
//! 성공하든 실패하든 패닉하든 엔티티를 삭제합니다. 패닉은 정리 후에
//! 다시 발생시킵니다.
//!
//! 정리 실패 처리:
//! - 본문 성공 후 정리 실패 → 정리 에러를 반환
//! - 본문 실패 후 정리 실패 → 정리 에러는 로그만 남기고 본문 에러를 반환

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::BoxFuture;
use metrics::counter;
use tracing::{debug, error, warn};

use crate::entity::{Entity, Lifecycle};
use crate::error::{CrudcheckError, RemoteError};
use crate::manager::EntityManager;
use crate::metrics::{LABEL_KIND, LABEL_RESULT, TEARDOWNS_TOTAL};
use crate::remote::ApplianceClient;

/// 엔티티 수명을 스코프에 묶는 헬퍼
pub struct Fixture;

impl Fixture {
    /// 엔티티를 생성하고 본문을 실행한 뒤 정리합니다.
    ///
    /// 생성이 실패하면 본문은 실행되지 않고 정리할 것도 없습니다.
    ///
    /// # 사용 예시
    /// ```ignore
    /// let title = Fixture::scoped(&manager, report, |manager, report| {
    ///     Box::pin(async move {
    ///         manager.update_with(report, ReportPatch::title("new")).await?;
    ///         Ok(report.title.clone())
    ///     })
    /// })
    /// .await?;
    /// ```
    pub async fn scoped<C, E, T, F>(
        manager: &EntityManager<C>,
        mut entity: E,
        body: F,
    ) -> Result<T, CrudcheckError>
    where
        C: ApplianceClient,
        E: Entity,
        F: for<'a> FnOnce(&'a EntityManager<C>, &'a mut E) -> BoxFuture<'a, Result<T, CrudcheckError>>,
    {
        manager.create(&mut entity).await?;
        Self::guard(manager, entity, body).await
    }

    /// 이미 생성된 엔티티로 본문을 실행한 뒤 정리합니다.
    pub async fn guard<C, E, T, F>(
        manager: &EntityManager<C>,
        mut entity: E,
        body: F,
    ) -> Result<T, CrudcheckError>
    where
        C: ApplianceClient,
        E: Entity,
        F: for<'a> FnOnce(&'a EntityManager<C>, &'a mut E) -> BoxFuture<'a, Result<T, CrudcheckError>>,
    {
        let outcome = AssertUnwindSafe(body(manager, &mut entity))
            .catch_unwind()
            .await;
        let teardown = Self::teardown(manager, &mut entity).await;

        match outcome {
            Err(panic) => {
                if let Err(e) = teardown {
                    error!(
                        kind = E::KIND.label(),
                        name = entity.name(),
                        error = %e,
                        "teardown failed after panic"
                    );
                }
                std::panic::resume_unwind(panic)
            }
            Ok(Ok(value)) => teardown.map(|()| value),
            Ok(Err(body_err)) => {
                if let Err(e) = teardown {
                    warn!(
                        kind = E::KIND.label(),
                        name = entity.name(),
                        error = %e,
                        "teardown failed after body error"
                    );
                }
                Err(body_err)
            }
        }
    }

    async fn teardown<C, E>(manager: &EntityManager<C>, entity: &mut E) -> Result<(), CrudcheckError>
    where
        C: ApplianceClient,
        E: Entity,
    {
        if entity.lifecycle() != Lifecycle::Live {
            debug!(
                kind = E::KIND.label(),
                name = entity.name(),
                "teardown skipped, entity not live"
            );
            return Ok(());
        }

        let result = match manager.delete(entity, false).await {
            // 본문이 다른 핸들로 이미 삭제한 경우
            Err(CrudcheckError::Remote(RemoteError::NotFound { .. })) => {
                entity.set_lifecycle(Lifecycle::Deleted);
                Ok(())
            }
            other => other,
        };

        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!(TEARDOWNS_TOTAL, LABEL_KIND => E::KIND.label(), LABEL_RESULT => outcome)
            .increment(1);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SessionConfig;
    use crate::entity::testing::Gadget;
    use crate::error::AssertionError;
    use crate::remote::MockApplianceClient;

    fn manager() -> EntityManager<MockApplianceClient> {
        EntityManager::new(Arc::new(MockApplianceClient::new()), SessionConfig::default())
    }

    #[tokio::test]
    async fn successful_body_is_torn_down() {
        let manager = manager();
        let value = Fixture::scoped(&manager, Gadget::new("f1"), |manager, gadget| {
            Box::pin(async move {
                manager.assert_exists(gadget).await?;
                Ok(gadget.name.clone())
            })
        })
        .await
        .unwrap();

        assert_eq!(value, "f1");
        assert_eq!(manager.client().count("delete"), 1);
        assert!(manager.client().records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_body_is_torn_down_and_error_kept() {
        let manager = manager();
        let err = Fixture::scoped(&manager, Gadget::new("f2"), |_, _| {
            Box::pin(async move {
                Err::<(), _>(CrudcheckError::from(AssertionError::Failed(
                    "boom".to_owned(),
                )))
            })
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("boom"));
        assert_eq!(manager.client().count("delete"), 1);
    }

    #[tokio::test]
    async fn body_that_deletes_skips_teardown() {
        let manager = manager();
        Fixture::scoped(&manager, Gadget::new("f3"), |manager, gadget| {
            Box::pin(async move {
                manager.delete(gadget, true).await?;
                Ok(())
            })
        })
        .await
        .unwrap();

        assert_eq!(manager.client().count("delete"), 1);
    }

    #[tokio::test]
    async fn teardown_tolerates_deletion_through_other_handle() {
        let manager = manager();
        Fixture::scoped(&manager, Gadget::new("f4"), |manager, gadget| {
            Box::pin(async move {
                let mut other = gadget.clone();
                manager.delete(&mut other, false).await?;
                Ok(())
            })
        })
        .await
        .unwrap();

        assert_eq!(manager.client().count("delete"), 2);
    }

    #[tokio::test]
    async fn panicking_body_is_torn_down_then_panic_resumes() {
        let manager = manager();
        let result = AssertUnwindSafe(Fixture::scoped::<_, _, (), _>(
            &manager,
            Gadget::new("f5"),
            |_, _| Box::pin(async move { panic!("body panicked") }),
        ))
        .catch_unwind()
        .await;

        assert!(result.is_err());
        assert_eq!(manager.client().count("delete"), 1);
        assert!(manager.client().records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_create_skips_body() {
        let manager = manager();
        let mut existing = Gadget::new("dup");
        manager.create(&mut existing).await.unwrap();

        let mut ran = false;
        let err = Fixture::scoped(&manager, Gadget::new("dup"), |_, _| {
            ran = true;
            Box::pin(async move { Ok(()) })
        })
        .await
        .unwrap_err();

        assert!(!ran);
        assert!(err.rejection().is_some());
        assert_eq!(manager.client().count("delete"), 0);
    }
}
