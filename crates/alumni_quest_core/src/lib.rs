pub mod bootstrap;
pub mod challenge;
pub mod directory;
pub mod domain;
pub mod ports;
pub mod profile;
pub mod prompts;
pub mod proof;
pub mod quest;
pub mod routing;
pub mod settlement;

pub use domain::{ChallengeMember, GroupChallenge, LeaderboardEntry, Peer, Prompt, UserProfile};
pub use ports::{DatabaseService, PortError, PortResult, PromptGenerationService};
pub use prompts::{fallback_prompts, PromptBoard, PromptSource, QuestionProvider};
pub use proof::{ProofError, ProofErrorCode, ProofSigner, ProofToken};
pub use quest::{BackOutcome, FlowError, InteractionSession, Stage};
pub use settlement::{Settlement, SettlementOutcome};
