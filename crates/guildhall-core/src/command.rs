//! Command abstractions.

use uuid::Uuid;

use crate::actor::Actor;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// The authenticated actor issuing the command.
    fn actor(&self) -> &Actor;
}

/// Implements [`Command`] for structs carrying `correlation_id` and `actor`
/// fields.
///
/// ```ignore
/// guildhall_core::impl_command! {
///     JoinParty => "party.join_party",
/// }
/// ```
#[macro_export]
macro_rules! impl_command {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl $crate::command::Command for $ty {
                fn command_type(&self) -> &'static str {
                    $name
                }

                fn correlation_id(&self) -> ::uuid::Uuid {
                    self.correlation_id
                }

                fn actor(&self) -> &$crate::actor::Actor {
                    &self.actor
                }
            }
        )*
    };
}
