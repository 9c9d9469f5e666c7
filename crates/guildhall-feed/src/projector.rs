//! Renders committed events as feed entries.

use std::cmp::Reverse;
use std::collections::HashMap;

use guildhall_core::error::DomainError;
use guildhall_core::event::decode_payload;
use guildhall_core::repository::StoredEvent;
use guildhall_donation::domain::events::{DonationEventKind, Gift};
use guildhall_loan::domain::events::{LoanEventKind, LoanSource, LoanTransitioned};
use guildhall_loan::domain::lifecycle::LoanAction;
use guildhall_market::domain::events::MerchantEventKind;
use guildhall_party::domain::events::PartyEventKind;
use uuid::Uuid;

use crate::entry::{FeedEntry, FeedKind};
use crate::names::NameTable;

#[derive(Debug, Clone)]
struct LoanFacts {
    amount: u64,
    borrower_id: String,
    source: LoanSource,
}

#[derive(Debug, Clone)]
struct DonationFacts {
    donor_id: String,
    gift: Gift,
}

/// Read-side state needed to render feed entries: names plus the loan and
/// donation details that later events refer to by id.
#[derive(Debug, Default, Clone)]
pub struct Projector {
    names: NameTable,
    loans: HashMap<Uuid, LoanFacts>,
    donations: HashMap<Uuid, DonationFacts>,
}

impl Projector {
    /// Folds a whole log.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a payload cannot be decoded.
    pub fn from_log(events: &[StoredEvent]) -> Result<Self, DomainError> {
        let mut projector = Self::default();
        for event in events {
            projector.observe(event)?;
        }
        Ok(projector)
    }

    /// Folds one committed event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a payload cannot be decoded.
    pub fn observe(&mut self, event: &StoredEvent) -> Result<(), DomainError> {
        self.names.observe(event)?;
        if event.event_type.starts_with("loan.") {
            if let LoanEventKind::LoanRequested(requested) = decode_payload::<LoanEventKind>(event)? {
                self.loans.insert(
                    requested.loan_id,
                    LoanFacts {
                        amount: requested.amount,
                        borrower_id: requested.borrower.discord_id,
                        source: requested.source,
                    },
                );
            }
        } else if event.event_type.starts_with("donation.") {
            if let DonationEventKind::DonationPledged(pledged) =
                decode_payload::<DonationEventKind>(event)?
            {
                self.donations.insert(
                    pledged.donation_id,
                    DonationFacts {
                        donor_id: pledged.donor.discord_id,
                        gift: pledged.gift,
                    },
                );
            }
        }
        Ok(())
    }

    /// Renders `event` against the current names. Events that are not feed
    /// activity render as `None`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a payload cannot be decoded.
    pub fn render(&self, event: &StoredEvent) -> Result<Option<FeedEntry>, DomainError> {
        let rendered = if event.event_type.starts_with("loan.") {
            match decode_payload::<LoanEventKind>(event)? {
                LoanEventKind::LoanTransitioned(step) => self.render_loan_step(&step),
                LoanEventKind::LoanRequested(_) => None,
            }
        } else if event.event_type.starts_with("party.") {
            self.render_party(decode_payload(event)?)
        } else if event.event_type.starts_with("merchant.") {
            self.render_merchant(decode_payload(event)?)
        } else if event.event_type.starts_with("donation.") {
            self.render_donation(decode_payload(event)?)
        } else {
            None
        };

        Ok(rendered.map(|(kind, sub_type, text)| FeedEntry {
            id: event.event_id,
            kind,
            sub_type,
            text,
            timestamp: event.occurred_at,
        }))
    }

    fn lender_name<'a>(&'a self, source: &'a LoanSource) -> &'a str {
        match source {
            LoanSource::Guild { guild } => guild,
            LoanSource::Merchant { merchant_id } => self.names.merchant(merchant_id),
        }
    }

    fn render_loan_step(&self, step: &LoanTransitioned) -> Option<(FeedKind, String, String)> {
        let facts = self.loans.get(&step.loan_id)?;
        let borrower = self.names.user(&facts.borrower_id);
        let lender = self.lender_name(&facts.source);
        let amount = facts.amount;
        let what = match step.action {
            LoanAction::Approve => format!("{lender} approved {borrower}'s loan of {amount} gold"),
            LoanAction::Reject => format!("{lender} rejected {borrower}'s loan of {amount} gold"),
            LoanAction::MarkReturned => format!("{borrower} returned {amount} gold to {lender}"),
            LoanAction::ConfirmCompleted => {
                format!("{lender} confirmed {borrower}'s repayment of {amount} gold")
            }
        };
        let text = format!("{what} ({} -> {})", step.from, step.to);
        Some((FeedKind::Loan, step.action.as_str().to_owned(), text))
    }

    fn render_party(&self, kind: PartyEventKind) -> Option<(FeedKind, String, String)> {
        let character_name =
            |id: Uuid| self.names.character(id).unwrap_or("An unknown character").to_owned();
        match kind {
            PartyEventKind::MemberJoined(joined) => Some((
                FeedKind::Party,
                "joined".to_owned(),
                format!(
                    "{} joined a party for {}",
                    character_name(joined.character_id),
                    joined.nest
                ),
            )),
            PartyEventKind::MemberLeft(left) => Some((
                FeedKind::Party,
                "left".to_owned(),
                format!(
                    "{} left their party for {}",
                    character_name(left.character_id),
                    left.nest
                ),
            )),
            PartyEventKind::PartyCreated(_) => None,
        }
    }

    fn render_merchant(&self, kind: MerchantEventKind) -> Option<(FeedKind, String, String)> {
        match kind {
            MerchantEventKind::GoldSold(sold) => Some((
                FeedKind::Gold,
                "sale".to_owned(),
                format!(
                    "{} sold {} gold to {} for {}",
                    self.names.merchant(&sold.merchant_id),
                    sold.amount,
                    self.names.user(&sold.buyer_id),
                    sold.price
                ),
            )),
            MerchantEventKind::ItemListed(listed) => Some((
                FeedKind::Item,
                "listed".to_owned(),
                format!(
                    "{} listed {} for {}",
                    self.names.merchant(&listed.merchant_id),
                    listed.item_name,
                    listed.price
                ),
            )),
            _ => None,
        }
    }

    fn render_donation(&self, kind: DonationEventKind) -> Option<(FeedKind, String, String)> {
        let DonationEventKind::DonationApproved(approved) = kind else {
            return None;
        };
        let facts = self.donations.get(&approved.donation_id)?;
        let donor = self.names.user(&facts.donor_id);
        let (kind, text) = match &facts.gift {
            Gift::Gold { amount } => (
                FeedKind::Gold,
                format!("{donor} donated {amount} gold to the guild"),
            ),
            Gift::Item { name, quantity } => (
                FeedKind::Item,
                format!("{donor} donated {quantity}x {name} to the guild"),
            ),
        };
        Some((kind, "donation".to_owned(), text))
    }
}

/// Projects a whole log into feed entries, newest first. Entries with equal
/// timestamps keep reverse insertion order.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a payload cannot be decoded.
pub fn project(events: &[StoredEvent]) -> Result<Vec<FeedEntry>, DomainError> {
    let projector = Projector::from_log(events)?;
    let mut entries: Vec<(usize, FeedEntry)> = Vec::new();
    for (position, event) in events.iter().enumerate() {
        if let Some(entry) = projector.render(event)? {
            entries.push((position, entry));
        }
    }
    entries.sort_by_key(|(position, entry)| (Reverse(entry.timestamp), Reverse(*position)));
    Ok(entries.into_iter().map(|(_, entry)| entry).collect())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use guildhall_character::application::command_handlers::{
        handle_create_character, handle_update_profile,
    };
    use guildhall_character::domain::commands::{CreateCharacter, UpdateProfile};
    use guildhall_character::domain::events::Stats;
    use guildhall_core::actor::Actor;
    use guildhall_core::clock::Clock;
    use guildhall_core::repository::EventRepository;
    use guildhall_core::retry::RetryPolicy;
    use guildhall_donation::application::command_handlers::{
        handle_approve_donation, handle_pledge_donation,
    };
    use guildhall_donation::domain::commands::{ApproveDonation, PledgeDonation};
    use guildhall_event_store::InMemoryEventRepository;
    use guildhall_loan::application::command_handlers::{
        handle_request_loan, handle_transition_loan,
    };
    use guildhall_loan::domain::commands::{RequestLoan, TransitionLoan};
    use guildhall_market::application::command_handlers::{
        handle_record_gold_sale, handle_register_merchant, handle_rename_merchant,
    };
    use guildhall_market::domain::commands::{RecordGoldSale, RegisterMerchant, RenameMerchant};
    use guildhall_party::application::command_handlers::{handle_create_party, handle_join_party};
    use guildhall_party::domain::commands::{CreateParty, JoinParty};
    use guildhall_test_support::{FixedClock, SteppingClock, fixed_now};

    use super::*;

    async fn run_loan_lifecycle(repo: &dyn EventRepository, clock: &dyn Clock) -> Uuid {
        let borrower = Actor::member("1001", "aster");
        let leader = Actor::guild_leader("9000", "boss");
        let loan_id = Uuid::new_v4();
        let request = RequestLoan {
            correlation_id: Uuid::new_v4(),
            actor: borrower.clone(),
            loan_id,
            amount: 100,
            source: LoanSource::Guild {
                guild: "Dawnbreakers".into(),
            },
            due_date: None,
        };
        handle_request_loan(&request, clock, repo).await.unwrap();
        for (actor, action) in [
            (&leader, LoanAction::Approve),
            (&borrower, LoanAction::MarkReturned),
            (&leader, LoanAction::ConfirmCompleted),
        ] {
            let step = TransitionLoan {
                correlation_id: Uuid::new_v4(),
                actor: actor.clone(),
                loan_id,
                action,
            };
            handle_transition_loan(&step, clock, repo, RetryPolicy::default())
                .await
                .unwrap();
        }
        loan_id
    }

    #[tokio::test]
    async fn test_loan_lifecycle_yields_three_entries_in_creation_order() {
        // Arrange: every event shares one timestamp, so order comes from
        // insertion alone.
        let repo = InMemoryEventRepository::new();
        run_loan_lifecycle(&repo, &FixedClock(fixed_now())).await;

        // Act
        let entries = project(&repo.load_all_events().await.unwrap()).unwrap();

        // Assert
        let loan_entries: Vec<&FeedEntry> =
            entries.iter().filter(|e| e.kind == FeedKind::Loan).collect();
        assert_eq!(loan_entries.len(), 3);
        let oldest_first: Vec<&str> = loan_entries
            .iter()
            .rev()
            .map(|e| e.sub_type.as_str())
            .collect();
        assert_eq!(oldest_first, vec!["approve", "markReturned", "confirmCompleted"]);
        assert_eq!(
            loan_entries[2].text,
            "Dawnbreakers approved aster's loan of 100 gold (waitingApproval -> active)"
        );
        assert_eq!(
            loan_entries[0].text,
            "Dawnbreakers confirmed aster's repayment of 100 gold (returned -> completed)"
        );
    }

    #[tokio::test]
    async fn test_rejected_loan_yields_single_reject_entry() {
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        let loan_id = Uuid::new_v4();
        let request = RequestLoan {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("1001", "aster"),
            loan_id,
            amount: 250,
            source: LoanSource::Guild {
                guild: "Dawnbreakers".into(),
            },
            due_date: None,
        };
        handle_request_loan(&request, &clock, &repo).await.unwrap();
        let reject = TransitionLoan {
            correlation_id: Uuid::new_v4(),
            actor: Actor::guild_leader("9000", "boss"),
            loan_id,
            action: LoanAction::Reject,
        };
        handle_transition_loan(&reject, &clock, &repo, RetryPolicy::default())
            .await
            .unwrap();

        let entries = project(&repo.load_all_events().await.unwrap()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, FeedKind::Loan);
        assert_eq!(entries[0].sub_type, "reject");
        assert_eq!(
            entries[0].text,
            "Dawnbreakers rejected aster's loan of 250 gold (waitingApproval -> rejected)"
        );
    }

    #[tokio::test]
    async fn test_entries_are_newest_first_by_timestamp() {
        let repo = InMemoryEventRepository::new();
        let clock = SteppingClock::new(fixed_now(), Duration::minutes(1));
        run_loan_lifecycle(&repo, &clock).await;

        let entries = project(&repo.load_all_events().await.unwrap()).unwrap();

        assert!(entries.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
        assert_eq!(entries[0].sub_type, "confirmCompleted");
    }

    #[tokio::test]
    async fn test_merchant_rename_applies_to_earlier_sales() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        let merchant = Actor::member("4004", "goldie");
        let register = RegisterMerchant {
            correlation_id: Uuid::new_v4(),
            actor: merchant.clone(),
            discord_name: "Goldie".into(),
            gold_available: 1_000,
            price_per_100: 50,
            advertisement: String::new(),
        };
        handle_register_merchant(&register, &clock, &repo).await.unwrap();
        let sale = RecordGoldSale {
            correlation_id: Uuid::new_v4(),
            actor: merchant.clone(),
            buyer_id: "1001".into(),
            buyer_name: "aster".into(),
            amount: 200,
        };
        handle_record_gold_sale(&sale, &clock, &repo, RetryPolicy::default())
            .await
            .unwrap();
        let rename = RenameMerchant {
            correlation_id: Uuid::new_v4(),
            actor: merchant,
            discord_name: "Gold Baron".into(),
        };
        handle_rename_merchant(&rename, &clock, &repo).await.unwrap();

        // Act
        let entries = project(&repo.load_all_events().await.unwrap()).unwrap();

        // Assert
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, FeedKind::Gold);
        assert_eq!(entries[0].sub_type, "sale");
        assert_eq!(entries[0].text, "Gold Baron sold 200 gold to aster for 100");
    }

    #[tokio::test]
    async fn test_party_join_uses_current_character_name() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        let actor = Actor::member("1001", "aster");
        let character_id = Uuid::new_v4();
        let create = CreateCharacter {
            correlation_id: Uuid::new_v4(),
            actor: actor.clone(),
            character_id,
            name: "Aster".into(),
            class: "Gladiator".into(),
            main_class: "Warrior".into(),
            stats: Stats::default(),
        };
        handle_create_character(&create, &clock, &repo).await.unwrap();
        let party_id = Uuid::new_v4();
        let party = CreateParty {
            correlation_id: Uuid::new_v4(),
            actor: actor.clone(),
            party_id,
            nest: "Sea Dragon Nest".into(),
            max_member: 4,
        };
        handle_create_party(&party, &clock, &repo, RetryPolicy::default())
            .await
            .unwrap();
        let join = JoinParty {
            correlation_id: Uuid::new_v4(),
            actor: actor.clone(),
            party_id,
            character_id,
        };
        handle_join_party(&join, &clock, &repo, RetryPolicy::default())
            .await
            .unwrap();
        let rename = UpdateProfile {
            correlation_id: Uuid::new_v4(),
            actor,
            character_id,
            name: "Asterion".into(),
            class: "Barbarian".into(),
            main_class: "Warrior".into(),
        };
        handle_update_profile(&rename, &clock, &repo).await.unwrap();

        // Act
        let entries = project(&repo.load_all_events().await.unwrap()).unwrap();

        // Assert
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, FeedKind::Party);
        assert_eq!(entries[0].text, "Asterion joined a party for Sea Dragon Nest");
    }

    #[tokio::test]
    async fn test_only_approved_donations_appear() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        let donor = Actor::member("1001", "aster");
        let approved_id = Uuid::new_v4();
        for (donation_id, gift) in [
            (approved_id, Gift::Item { name: "Lustrous Gem".into(), quantity: 3 }),
            (Uuid::new_v4(), Gift::Gold { amount: 500 }),
        ] {
            let pledge = PledgeDonation {
                correlation_id: Uuid::new_v4(),
                actor: donor.clone(),
                donation_id,
                gift,
            };
            handle_pledge_donation(&pledge, &clock, &repo).await.unwrap();
        }
        let approve = ApproveDonation {
            correlation_id: Uuid::new_v4(),
            actor: Actor::guild_leader("9000", "boss"),
            donation_id: approved_id,
        };
        handle_approve_donation(&approve, &clock, &repo, RetryPolicy::default())
            .await
            .unwrap();

        // Act
        let entries = project(&repo.load_all_events().await.unwrap()).unwrap();

        // Assert
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, FeedKind::Item);
        assert_eq!(entries[0].sub_type, "donation");
        assert_eq!(entries[0].text, "aster donated 3x Lustrous Gem to the guild");
    }

    #[test]
    fn test_empty_log_projects_to_empty_feed() {
        assert!(project(&[]).unwrap().is_empty());
    }
}
