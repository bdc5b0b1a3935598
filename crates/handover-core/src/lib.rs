//! Bot-to-bot orchestration for a primary conversational bot.
//!
//! A primary bot hands an in-progress conversation to a secondary bot, keeps
//! the handoff as an [`OrchestrationRecord`], resumes the secondary bot on
//! each turn, and takes the conversation back on stop intents, inactivity or
//! failure.
//!
//! ```text
//! inbound turn ──► OrchestrationInterceptor ──► OrchestratorClient
//!                        │        │                   │
//!                        │        ▼                   ▼
//!                        │    FlagStore        OrchestrationResponse
//!                        ▼
//!                   RecordStore ──► DialogBus (send / end / switch_story)
//! ```

pub mod action;
pub mod bus;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod flags;
pub mod interceptor;
pub mod io;
pub mod paths;
pub mod protocol;
pub mod record;
pub mod secondary;
pub mod store;
pub mod takeback;
pub mod types;

pub use action::{ActionMetadata, ActionPayload, SecondaryBotAction, UserAction};
pub use bus::{BotMessage, DialogBus, Turn, TurnBus};
pub use client::{OrchestratorClient, TimeoutClient};
pub use error::{HandoverError, OrchestratorError, Result};
pub use events::{DefaultEventHandler, EventOutcome, OrchestrationEventHandler};
pub use flags::{FlagStore, MemoryFlagStore, SessionFlag};
pub use interceptor::{Flow, InterceptorBuilder, OrchestrationInterceptor};
pub use protocol::{EligibilityRequest, OrchestrationResponse, ResumeRequest, SessionData};
pub use record::{OrchestrationRecord, OrchestrationStatus, TargetBot, TargetMetadata};
pub use secondary::SecondaryResponseInterceptor;
pub use store::{MemoryStore, RecordStore, RedbStore};
pub use types::{ConnectorType, ParticipantId};
