//! Client-side UI state engine for the Power BI measure explorer dashboard.
//!
//! The [`shell::Shell`] drives theme state, tab selection, toast
//! notifications, animated metric counters, and the two AI-backed panels
//! (optimized rewrite and explanation) for the selected measure. The page
//! itself is reached through the [`dom::Dom`] trait; time advances through a
//! virtual timer queue ([`runtime::Timers`]).
pub mod ai;
pub mod config;
pub mod counter;
pub mod diagnostics;
pub mod dom;
pub mod notify;
pub mod runtime;
pub mod shell;
pub mod storage;
pub mod tabs;
pub mod theme;
pub mod utils;
