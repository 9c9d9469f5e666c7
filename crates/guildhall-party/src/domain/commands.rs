//! Commands for the Party Membership context.

use guildhall_core::actor::Actor;
use uuid::Uuid;

/// Command to form a new party in a nest.
#[derive(Debug, Clone)]
pub struct CreateParty {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The forming user.
    pub actor: Actor,
    /// The new party's identifier.
    pub party_id: Uuid,
    /// The nest the party runs.
    pub nest: String,
    /// Member cap.
    pub max_member: u32,
}

/// Command to seat a character in a party.
#[derive(Debug, Clone)]
pub struct JoinParty {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The requesting user; must own the character.
    pub actor: Actor,
    /// The party to join.
    pub party_id: Uuid,
    /// The character taking the seat.
    pub character_id: Uuid,
}

/// Command to give up a seat.
#[derive(Debug, Clone)]
pub struct LeaveParty {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The requesting user; must hold the seat.
    pub actor: Actor,
    /// The party.
    pub party_id: Uuid,
    /// The seated character.
    pub character_id: Uuid,
}

guildhall_core::impl_command! {
    CreateParty => "party.create_party",
    JoinParty => "party.join_party",
    LeaveParty => "party.leave_party",
}
