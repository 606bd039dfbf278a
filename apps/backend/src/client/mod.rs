//! Client-side game session: local state, broadcast handling, the round
//! countdown and drawing classification.
//!
//! A session talks to the authoritative record only through [`GameApi`] and
//! to other sessions only through a [`BroadcastChannel`].

pub mod api;
pub mod archive;
pub mod channel;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod drawing;
pub mod gate;
pub mod session;
pub mod store;

pub use api::{GameApi, HttpGameApi, ServiceGameApi};
pub use archive::{Archive, ArchiveRecord, HttpArchive, NoopArchive};
pub use channel::{BroadcastChannel, HubChannel, WsChannel};
pub use classifier::{Classifier, HttpClassifier};
pub use config::ClientConfig;
pub use coordinator::{CoordinatorPhase, Countdown, RoundCoordinator};
pub use drawing::Drawing;
pub use gate::{guess_matches, Attempt, ClassificationGate, Verdict};
pub use session::{Attachment, ClientSession, Handled, SessionDeps, SubmitOutcome};
pub use store::{ApplyOutcome, FileStorage, GameStateStore, MemoryStorage, SnapshotStorage};
