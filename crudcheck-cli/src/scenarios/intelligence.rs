//! 리포트, 스케줄, 위젯, 대시보드 시나리오
//!
//! 모든 엔티티는 [`Fixture::scoped`]로 만들어 실패해도 정리됩니다.

use futures::FutureExt;

use crudcheck_core::error::CrudcheckError;
use crudcheck_core::fixture::Fixture;
use crudcheck_core::manager::EntityManager;
use crudcheck_core::names::{random_alphanumeric, random_name};
use crudcheck_core::remote::ApplianceClient;
use crudcheck_intelligence::{
    ChartWidget, CustomReport, Dashboard, DashboardPatch, MenuWidget, ReportPatch, ReportWidget,
    RssFeedWidget, Runs, Schedule, SchedulePatch, Visibility, Widget, WidgetPatch,
};

use super::ensure;

const ADMIN_ROLE: &str = "EvmRole-administrator";
const ADMIN_GROUP: &str = "EvmGroup-administrator";

/// 제목 변경 → 실행 완료 대기 → 저장된 결과 확인 → 삭제 대기
pub(super) async fn custom_report_crud<C: ApplianceClient>(
    manager: &EntityManager<C>,
    report: CustomReport,
) -> Result<(), CrudcheckError> {
    Fixture::scoped(manager, report, |manager, report| {
        async move {
            let title = format!("{} {}", report.title, random_alphanumeric(6));
            manager
                .update_with(report, ReportPatch::new().title(title.as_str()))
                .await?;
            ensure(report.title == title, || {
                format!("title is {:?}, expected {title:?}", report.title)
            })?;

            let runs = Runs::new(manager);
            runs.queue(&*report, true).await?;
            for saved in runs.saved_runs(&*report).await? {
                ensure(saved.columns == report.report_fields, || {
                    format!(
                        "run {} has columns {:?}, expected {:?}",
                        saved.id, saved.columns, report.report_fields
                    )
                })?;
                ensure(!saved.rows.is_empty(), || format!("run {} saved no rows", saved.id))?;
            }

            manager.delete(report, true).await?;
            manager.assert_absent(&*report).await
        }
        .boxed()
    })
    .await
}

/// 설명과 활성 여부 변경 → 실행 → 삭제 대기
pub(super) async fn schedule_crud<C: ApplianceClient>(
    manager: &EntityManager<C>,
    schedule: Schedule,
) -> Result<(), CrudcheckError> {
    Fixture::scoped(manager, schedule, |manager, schedule| {
        async move {
            manager
                .update_with(
                    schedule,
                    SchedulePatch::new()
                        .description("badger badger badger")
                        .active(false),
                )
                .await?;
            manager.refresh(schedule).await?;
            ensure(
                schedule.description == "badger badger badger" && !schedule.active,
                || format!("schedule update not visible: {schedule:?}"),
            )?;

            Runs::new(manager).queue(&*schedule, true).await?;
            manager.delete(schedule, true).await?;
            manager.assert_absent(&*schedule).await
        }
        .boxed()
    })
    .await
}

pub(super) async fn menu_widget_crud<C: ApplianceClient>(
    manager: &EntityManager<C>,
) -> Result<(), CrudcheckError> {
    let widget = MenuWidget::new(
        random_name("menu"),
        random_alphanumeric(12),
        [
            ("Services / Catalogs", random_alphanumeric(8)),
            ("Clouds / Providers", random_alphanumeric(8)),
        ],
        Visibility::by_role(ADMIN_ROLE),
    );
    deactivate_widget(manager, widget).await
}

pub(super) async fn report_widget_crud<C: ApplianceClient>(
    manager: &EntityManager<C>,
) -> Result<(), CrudcheckError> {
    let widget = ReportWidget::new(
        random_name("report"),
        random_alphanumeric(12),
        ["Events", "Operations", "Operations VMs Powered On/Off for Last Week"],
        ["VM Name", "Message"],
        10,
        Visibility::by_role(ADMIN_ROLE),
    );
    deactivate_widget(manager, widget).await
}

pub(super) async fn chart_widget_crud<C: ApplianceClient>(
    manager: &EntityManager<C>,
) -> Result<(), CrudcheckError> {
    let widget = ChartWidget::new(
        random_name("chart"),
        random_alphanumeric(12),
        "Configuration Management/Virtual Machines/Vendor and Guest OS",
        Visibility::by_role(ADMIN_ROLE),
    );
    deactivate_widget(manager, widget).await
}

/// 비활성화 후 내부 피드 → 알려진 외부 피드 → 외부 URL 순으로 바꿉니다.
pub(super) async fn rss_feed_widget_crud<C: ApplianceClient>(
    manager: &EntityManager<C>,
) -> Result<(), CrudcheckError> {
    let widget = RssFeedWidget::internal(
        random_name("rss"),
        random_alphanumeric(12),
        "Administrative Events",
        8,
        Visibility::by_role(ADMIN_ROLE),
    );

    Fixture::scoped(manager, widget, |manager, widget| {
        async move {
            manager
                .update_with(widget, WidgetPatch::new().active(false))
                .await?;
            manager
                .update_with(widget, |w: &mut RssFeedWidget| w.use_external("SlashDot"))
                .await?;
            manager
                .update_with(widget, |w: &mut RssFeedWidget| {
                    w.use_external("http://rss.example.com/")
                })
                .await?;

            manager.refresh(widget).await?;
            ensure(
                !widget.active && widget.external.as_deref() == Some("http://rss.example.com/"),
                || format!("rss widget update not visible: {widget:?}"),
            )?;
            Ok(())
        }
        .boxed()
    })
    .await
}

/// 잠금 설정/해제 → 위젯 목록 교체 → 삭제 대기
pub(super) async fn dashboard_crud<C: ApplianceClient>(
    manager: &EntityManager<C>,
) -> Result<(), CrudcheckError> {
    let dashboard = Dashboard::new(
        random_name("dash"),
        ADMIN_GROUP,
        random_alphanumeric(10),
        false,
        ["Top CPU Consumers (weekly)", "Vendor and Guest OS Chart"],
    );

    Fixture::scoped(manager, dashboard, |manager, dashboard| {
        async move {
            for locked in [true, false] {
                manager
                    .update_with(dashboard, DashboardPatch::new().locked(locked))
                    .await?;
                ensure(dashboard.locked == locked, || {
                    format!("dashboard locked is {}, expected {locked}", dashboard.locked)
                })?;
            }

            manager
                .update_with(
                    dashboard,
                    DashboardPatch::new().widgets(["Top Storage Consumers"]),
                )
                .await?;
            manager.refresh(dashboard).await?;
            ensure(dashboard.widgets == ["Top Storage Consumers"], || {
                format!("dashboard widgets are {:?}", dashboard.widgets)
            })?;

            manager.delete(dashboard, true).await?;
            manager.assert_absent(&*dashboard).await
        }
        .boxed()
    })
    .await
}

/// 위젯 공통: 생성 → 비활성화 → 재조회 확인 → 정리
async fn deactivate_widget<C, W>(manager: &EntityManager<C>, widget: W) -> Result<(), CrudcheckError>
where
    C: ApplianceClient,
    W: Widget,
{
    Fixture::scoped(manager, widget, |manager, widget| {
        async move {
            manager
                .update_with(widget, WidgetPatch::new().active(false))
                .await?;
            manager.refresh(widget).await?;
            ensure(!widget.active(), || format!("{} is still active", widget.title()))?;
            Ok(())
        }
        .boxed()
    })
    .await
}
