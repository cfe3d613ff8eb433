//! Announcement reconciliation core.
//!
//! Renders a stored config into a platform-neutral message body, diffs the
//! desired channel set against the recorded one, fans the per-channel
//! operations out concurrently, and persists whatever succeeded. The public
//! operations (create/update/delete/toggle) are thin orchestration on top.

pub mod error;
pub mod reconcile;
pub mod render;
pub mod service;

pub use {
    error::{Error, Result},
    reconcile::{ChannelResult, DeliveryStatus, DesiredTarget, ReconcileReport, RetiredTarget},
    render::render,
    service::{
        AnnouncementPatch, AnnouncementService, NewAnnouncement, PublishOutcome, SentMessage,
    },
};
