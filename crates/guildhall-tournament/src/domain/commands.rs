//! Commands for the Tournament Roster context.

use guildhall_core::actor::Actor;
use uuid::Uuid;

/// Command to create a tournament.
#[derive(Debug, Clone)]
pub struct CreateTournament {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The creating guild leader.
    pub actor: Actor,
    /// The new tournament's identifier.
    pub tournament_id: Uuid,
    /// Display name.
    pub name: String,
    /// Participant cap.
    pub max_participants: u32,
}

/// Command to sign up for a tournament.
#[derive(Debug, Clone)]
pub struct JoinTournament {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The signing-up user; must own the character.
    pub actor: Actor,
    /// The tournament identifier.
    pub tournament_id: Uuid,
    /// The entered character.
    pub character_id: Uuid,
}

/// Command to close sign-ups and start play.
#[derive(Debug, Clone)]
pub struct StartTournament {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The running guild leader.
    pub actor: Actor,
    /// The tournament identifier.
    pub tournament_id: Uuid,
}

/// Command to end a tournament.
#[derive(Debug, Clone)]
pub struct CompleteTournament {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The running guild leader.
    pub actor: Actor,
    /// The tournament identifier.
    pub tournament_id: Uuid,
}

guildhall_core::impl_command! {
    CreateTournament => "tournament.create_tournament",
    JoinTournament => "tournament.join_tournament",
    StartTournament => "tournament.start_tournament",
    CompleteTournament => "tournament.complete_tournament",
}
