//! Calendar provider traits and implementations.
//!
//! - [`LocalCalendarProvider`] / [`RemoteCalendarProvider`]: the two backend
//!   contracts the sync engine consumes
//! - [`RawEvent`]: provider-agnostic event data
//! - [`normalize_event`]: the only way provider data becomes an
//!   [`EventRecord`](wellsync_core::EventRecord)
//! - [`OAuthSession`] / [`AuthorizationRequest`]: in-memory OAuth state
//! - [`ProviderError`]: error type for every provider operation
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐    ┌──────────────────────┐
//! │ calendar directory   │    │ Google Calendar API  │
//! └──────────┬───────────┘    └──────────┬───────────┘
//!            ▼                           ▼
//! ┌──────────────────────┐    ┌──────────────────────┐
//! │ IcsDirectoryProvider │    │ GoogleProvider       │
//! │ (LocalCalendar...)   │    │ (RemoteCalendar...)  │
//! └──────────┬───────────┘    └──────────┬───────────┘
//!            └────────────┬──────────────┘
//!                         ▼
//!                   ┌───────────┐
//!                   │ RawEvent  │
//!                   └─────┬─────┘
//!                         ▼ normalize_event()
//!                  ┌─────────────┐
//!                  │ EventRecord │
//!                  └─────────────┘
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
#[cfg(feature = "ics")]
pub mod ics;
pub mod normalize;
pub mod provider;
pub mod raw_event;
pub mod session;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{normalize_event, normalize_events};
pub use provider::{
    BoxFuture, CalendarDescriptor, EventPatch, LocalCalendarProvider, RemoteCalendarProvider,
};
pub use raw_event::{RawEvent, RawEventTime};
pub use session::{AuthorizationRequest, OAuthSession};
