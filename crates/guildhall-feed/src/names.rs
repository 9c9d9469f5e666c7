//! Display names resolved at read time.

use std::collections::HashMap;

use guildhall_character::domain::events::CharacterEventKind;
use guildhall_core::error::DomainError;
use guildhall_core::event::decode_payload;
use guildhall_core::repository::StoredEvent;
use guildhall_donation::domain::events::DonationEventKind;
use guildhall_loan::domain::events::LoanEventKind;
use guildhall_market::domain::events::MerchantEventKind;
use uuid::Uuid;

/// Latest known names for merchants, characters and users.
///
/// Built by folding the log in insertion order; later events overwrite
/// earlier names.
#[derive(Debug, Default, Clone)]
pub struct NameTable {
    merchants: HashMap<String, String>,
    characters: HashMap<Uuid, String>,
    users: HashMap<String, String>,
}

impl NameTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one committed event into the table. Events that carry no names
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a payload cannot be decoded.
    pub fn observe(&mut self, event: &StoredEvent) -> Result<(), DomainError> {
        let event_type = event.event_type.as_str();
        if event_type.starts_with("character.") {
            match decode_payload::<CharacterEventKind>(event)? {
                CharacterEventKind::CharacterCreated(created) => {
                    self.characters.insert(created.character_id, created.name);
                }
                CharacterEventKind::ProfileUpdated(updated) => {
                    self.characters.insert(updated.character_id, updated.name);
                }
                _ => {}
            }
        } else if event_type.starts_with("merchant.") {
            match decode_payload::<MerchantEventKind>(event)? {
                MerchantEventKind::MerchantRegistered(registered) => {
                    self.merchants
                        .insert(registered.merchant_id, registered.discord_name);
                }
                MerchantEventKind::MerchantRenamed(renamed) => {
                    self.merchants.insert(renamed.merchant_id, renamed.discord_name);
                }
                MerchantEventKind::GoldSold(sold) => {
                    self.users.insert(sold.buyer_id, sold.buyer_name);
                }
                _ => {}
            }
        } else if event_type.starts_with("loan.") {
            match decode_payload::<LoanEventKind>(event)? {
                LoanEventKind::LoanRequested(requested) => {
                    self.users
                        .insert(requested.borrower.discord_id, requested.borrower.name);
                }
                LoanEventKind::LoanTransitioned(step) => {
                    self.users
                        .insert(step.actor.user_id, step.actor.display_name);
                }
            }
        } else if event_type.starts_with("donation.") {
            if let DonationEventKind::DonationPledged(pledged) =
                decode_payload::<DonationEventKind>(event)?
            {
                self.users
                    .insert(pledged.donor.discord_id, pledged.donor.name);
            }
        }
        Ok(())
    }

    /// The merchant's display name, or its id if unknown.
    #[must_use]
    pub fn merchant<'a>(&'a self, merchant_id: &'a str) -> &'a str {
        self.merchants.get(merchant_id).map_or(merchant_id, String::as_str)
    }

    /// The character's name, if known.
    #[must_use]
    pub fn character(&self, character_id: Uuid) -> Option<&str> {
        self.characters.get(&character_id).map(String::as_str)
    }

    /// The user's latest display name, or the id if unknown.
    #[must_use]
    pub fn user<'a>(&'a self, user_id: &'a str) -> &'a str {
        self.users.get(user_id).map_or(user_id, String::as_str)
    }
}
