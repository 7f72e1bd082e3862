pub mod achievement;
pub mod app;
pub mod daily_rollup;
pub mod focus_session;
pub mod minute_counter;
pub mod sample;

pub use achievement::EarnedAchievement;
pub use app::App;
pub use daily_rollup::DailyRollup;
pub use focus_session::FocusSession;
pub use minute_counter::{CounterDeltas, CounterTotals, MinuteCounter};
pub use sample::{ClickPoint, KeycodeCount, SampleItem, SampleKind, SamplePayload, SampleRow};
