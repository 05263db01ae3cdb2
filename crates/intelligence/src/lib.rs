#![doc = include_str!("../README.md")]

pub mod cases;
pub mod dashboard;
pub mod error;
pub mod report;
pub mod runs;
pub mod schedule;
pub mod widget;

pub use dashboard::{Dashboard, DashboardPatch};
pub use error::IntelligenceError;
pub use report::{CustomReport, ReportPatch};
pub use runs::{Runnable, Runs};
pub use schedule::{Schedule, SchedulePatch, Timer};
pub use widget::{
    ChartWidget, FeedType, MenuWidget, ReportWidget, RssFeedWidget, Visibility, Widget, WidgetPatch,
};
