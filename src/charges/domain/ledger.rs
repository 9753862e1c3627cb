use std::collections::HashMap;
use chrono::NaiveDateTime;
use serde::Serialize;
use crate::charges::domain::model::{ChargedItem, Hold, HoldState, ResourceChargeList};
use crate::core::domain::LoanPolicy;
use crate::core::events::{DomainEvent, DomainEventType};
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::CDL_EVENT_GROUP;
use crate::gateway::notifier::NotificationTemplate;
use crate::utils::date::serializer;

// LedgerEffect is one state transition applied to a charge list, emitted once after it is persisted.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum LedgerEffect {
    Charged {
        item: ChargedItem,
    },
    HoldConverted {
        item: ChargedItem,
    },
    HoldCreated {
        netid: String,
        position: usize,
    },
    HoldActivated {
        netid: String,
        #[serde(with = "serializer")]
        expiration_time: NaiveDateTime,
    },
    HoldExpired {
        netid: String,
    },
    ChargeExpired {
        item: ChargedItem,
    },
    ChargeReturned {
        item: ChargedItem,
    },
}

impl LedgerEffect {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEffect::Charged { .. } => "charge",
            LedgerEffect::HoldConverted { .. } => "hold_converted",
            LedgerEffect::HoldCreated { .. } => "hold_created",
            LedgerEffect::HoldActivated { .. } => "hold_activated",
            LedgerEffect::HoldExpired { .. } => "hold_expired",
            LedgerEffect::ChargeExpired { .. } => "charge_expired",
            LedgerEffect::ChargeReturned { .. } => "charge_returned",
        }
    }

    pub fn netid(&self) -> &str {
        match self {
            LedgerEffect::Charged { item } |
            LedgerEffect::HoldConverted { item } |
            LedgerEffect::ChargeExpired { item } |
            LedgerEffect::ChargeReturned { item } => item.netid.as_str(),
            LedgerEffect::HoldCreated { netid, .. } |
            LedgerEffect::HoldActivated { netid, .. } |
            LedgerEffect::HoldExpired { netid } => netid.as_str(),
        }
    }

    pub fn kind(&self) -> DomainEventType {
        match self {
            LedgerEffect::Charged { .. } | LedgerEffect::HoldCreated { .. } => DomainEventType::Added,
            LedgerEffect::HoldActivated { .. } => DomainEventType::Updated,
            _ => DomainEventType::Deleted,
        }
    }

    // only hold transitions are mailed to patrons
    pub fn notification(&self) -> Option<NotificationTemplate> {
        match self {
            LedgerEffect::HoldActivated { .. } => Some(NotificationTemplate::HoldActivated),
            LedgerEffect::HoldExpired { .. } => Some(NotificationTemplate::HoldExpired),
            _ => None,
        }
    }

    pub fn to_event(&self, resource_id: &str) -> LibraryResult<DomainEvent> {
        let metadata = HashMap::from([("netid".to_string(), self.netid().to_string())]);
        Ok(DomainEvent::new(self.name(), CDL_EVENT_GROUP, resource_id, self.kind(), &metadata, self)?)
    }
}

// Transition pairs the result of a ledger operation with the effects it applied.
// A transition without effects left the ledger untouched and must not be written.
#[derive(Debug, PartialEq, Clone)]
pub struct Transition<T> {
    pub outcome: T,
    pub effects: Vec<LedgerEffect>,
}

impl<T> Transition<T> {
    pub fn new(outcome: T, effects: Vec<LedgerEffect>) -> Self {
        Self { outcome, effects }
    }

    pub fn unchanged(outcome: T) -> Self {
        Self { outcome, effects: vec![] }
    }

    pub fn changed(&self) -> bool {
        !self.effects.is_empty()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum HoldOutcome {
    Charged(ChargedItem),
    Queued {
        hold: Hold,
        position: usize,
    },
}

// LedgerSummary counts the maintenance transitions applied by expiration and activation
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct LedgerSummary {
    pub expired_charges: usize,
    pub expired_holds: usize,
    pub activated_holds: usize,
}

impl LedgerSummary {
    pub fn from_effects(effects: &[LedgerEffect]) -> Self {
        let mut summary = LedgerSummary::default();
        for effect in effects {
            match effect {
                LedgerEffect::ChargeExpired { .. } => summary.expired_charges += 1,
                LedgerEffect::HoldExpired { .. } => summary.expired_holds += 1,
                LedgerEffect::HoldActivated { .. } => summary.activated_holds += 1,
                _ => {}
            }
        }
        summary
    }
}

// Pure transforms on an in-memory ledger. Every mutation runs the expiration step first so
// that a rewrite never keeps lapsed state and each transition is reported by the write that persists it.
impl ResourceChargeList {
    pub fn expire(&mut self, now: NaiveDateTime) -> Vec<LedgerEffect> {
        let mut effects = vec![];
        let (expired, kept): (Vec<ChargedItem>, Vec<ChargedItem>) = self.charged_items.drain(..)
            .partition(|c| c.is_expired(now));
        self.charged_items = kept;
        for item in expired {
            effects.push(LedgerEffect::ChargeExpired { item });
        }
        for hold in self.hold_queue.iter_mut() {
            if hold.is_lapsed(now) {
                hold.state = HoldState::Expired;
                effects.push(LedgerEffect::HoldExpired { netid: hold.netid.to_string() });
            }
        }
        effects
    }

    pub fn available_for_charge(&self, netid: &str, item_ids: &[String], now: NaiveDateTime) -> bool {
        if item_ids.is_empty() {
            return false;
        }
        if self.hold_queue.iter().any(|h| h.netid == netid && h.is_active(now)) {
            return self.unexpired_charges(now).len() < item_ids.len()
                && item_ids.iter().any(|id| !self.is_charged(id, now));
        }
        if !self.live_holds(now).is_empty() {
            return false;
        }
        self.free_slots(item_ids.len(), now) > 0
    }

    pub fn charge(&mut self, netid: &str, item_ids: &[String], now: NaiveDateTime,
                  policy: &LoanPolicy) -> LibraryResult<Transition<ChargedItem>> {
        if let Some(existing) = self.charge_for(netid, now) {
            return Ok(Transition::unchanged(existing.clone()));
        }
        if !self.available_for_charge(netid, item_ids, now) {
            return Err(LibraryError::unavailable_for_charge(
                format!("{} is not available for charge to {}", self.resource_id, netid).as_str()));
        }
        let mut effects = self.expire(now);
        // the patron's own lapsed hold is converted by this write
        effects.retain(|e| !matches!(e, LedgerEffect::HoldExpired { netid: expired } if expired == netid));
        let item_id = item_ids.iter()
            .find(|id| !self.is_charged(id, now))
            .ok_or_else(|| LibraryError::unavailable_for_charge(
                format!("no uncharged item left for {}", self.resource_id).as_str()))?
            .to_string();
        let item = ChargedItem::new(item_id.as_str(), netid, now + policy.charge_duration);
        let before = self.hold_queue.len();
        self.hold_queue.retain(|h| h.netid != netid);
        self.charged_items.push(item.clone());
        if self.hold_queue.len() < before {
            effects.push(LedgerEffect::HoldConverted { item: item.clone() });
        } else {
            effects.push(LedgerEffect::Charged { item: item.clone() });
        }
        Ok(Transition::new(item, effects))
    }

    pub fn place_hold(&mut self, netid: &str, item_ids: &[String], now: NaiveDateTime,
                      policy: &LoanPolicy) -> LibraryResult<Transition<HoldOutcome>> {
        if let Some(existing) = self.charge_for(netid, now) {
            return Ok(Transition::unchanged(HoldOutcome::Charged(existing.clone())));
        }
        if self.available_for_charge(netid, item_ids, now) {
            let charged = self.charge(netid, item_ids, now, policy)?;
            return Ok(Transition::new(HoldOutcome::Charged(charged.outcome), charged.effects));
        }
        if self.hold_for(netid, now).is_some() {
            return Err(LibraryError::hold_exists(
                format!("{} already holds {}", netid, self.resource_id).as_str()));
        }
        let mut effects = self.expire(now);
        // an expired entry is replaced rather than stacked
        self.hold_queue.retain(|h| h.netid != netid);
        let hold = Hold::new(netid, now);
        self.hold_queue.push(hold.clone());
        let position = self.hold_position(netid, now).unwrap_or(self.hold_queue.len());
        effects.push(LedgerEffect::HoldCreated { netid: netid.to_string(), position });
        Ok(Transition::new(HoldOutcome::Queued { hold, position }, effects))
    }

    pub fn activate_holds(&mut self, item_ids: &[String], now: NaiveDateTime,
                          policy: &LoanPolicy) -> Transition<LedgerSummary> {
        let mut effects = self.expire(now);
        let mut free_slots = self.free_slots(item_ids.len(), now);
        for hold in self.hold_queue.iter_mut() {
            if free_slots == 0 {
                break;
            }
            if hold.is_inactive() {
                let expiration_time = now + policy.hold_duration;
                hold.state = HoldState::Active { expiration_time };
                effects.push(LedgerEffect::HoldActivated { netid: hold.netid.to_string(), expiration_time });
                free_slots -= 1;
            }
        }
        Transition::new(LedgerSummary::from_effects(&effects), effects)
    }

    pub fn expire_all(&mut self, now: NaiveDateTime) -> Transition<LedgerSummary> {
        let effects = self.expire(now);
        Transition::new(LedgerSummary::from_effects(&effects), effects)
    }

    pub fn return_charge(&mut self, netid: &str, now: NaiveDateTime) -> LibraryResult<Transition<ChargedItem>> {
        if self.charge_for(netid, now).is_none() {
            return Err(LibraryError::not_charged(
                format!("{} has no charge on {}", netid, self.resource_id).as_str()));
        }
        let mut effects = self.expire(now);
        let pos = self.charged_items.iter().position(|c| c.netid == netid)
            .ok_or_else(|| LibraryError::not_charged(
                format!("{} has no charge on {}", netid, self.resource_id).as_str()))?;
        let item = self.charged_items.remove(pos);
        effects.push(LedgerEffect::ChargeReturned { item: item.clone() });
        Ok(Transition::new(item, effects))
    }
}
