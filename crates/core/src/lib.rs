//! Core library for the Vines rhythm game.
//!
//! Charts are sets of paths whose points are revealed along smooth curves as
//! the chart clock advances. Points that ask for a button are judged against
//! player input, and the outcomes drive combo, score and accuracy. Each
//! module owns one piece of that pipeline (tempo mapping, path flattening,
//! judgment, scoring, camera motion) and [`Session`] ties them together for a
//! single play-through. Drawing, audio and file formats beyond plain JSON are
//! left to the caller.

pub mod camera;
pub mod chart;
pub mod config;
pub mod cosmetic;
pub mod error;
pub mod geometry;
pub mod judgment;
pub mod render;
pub mod score;
pub mod session;
pub mod tempo;
pub mod timeline;

pub use camera::{CameraPoint, CameraTrack, Easing, Vec2};
pub use chart::{Button, Chart, ChartMeta, ChartPoint, PointKey};
pub use config::{AppConfig, AudioConfig, GameplayConfig};
pub use cosmetic::{Cosmetic, CosmeticSource, RandomCosmetics};
pub use error::{Result, VinesError};
pub use geometry::{flatten, Flatten, PathGeometry, Segment};
pub use judgment::{
    Hit, HitWindow, JudgeEntry, JudgmentEngine, JudgmentEvent, JudgmentState, PointJudgment, Tier,
};
pub use render::{FrameView, Marker, MarkerKind};
pub use score::{Rank, ScoreState, ScoreTracker, TierCounts};
pub use session::{Session, Signal, StepReport};
pub use tempo::{TempoMap, TempoPoint};
pub use timeline::{InputEvent, InputQueue, PlaybackClock};
