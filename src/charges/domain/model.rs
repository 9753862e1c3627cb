use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// ChargedItem is one active digital loan: an eligible item slot lent to a patron until expiration_time.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ChargedItem {
    pub item_id: String,
    pub netid: String,
    #[serde(with = "serializer")]
    pub expiration_time: NaiveDateTime,
}

impl ChargedItem {
    pub fn new(item_id: &str, netid: &str, expiration_time: NaiveDateTime) -> Self {
        Self {
            item_id: item_id.to_string(),
            netid: netid.to_string(),
            expiration_time,
        }
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expiration_time <= now
    }
}

// HoldState is the lifecycle of a queued request. A converted hold is simply removed from the queue.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HoldState {
    Inactive,
    Active {
        #[serde(with = "serializer")]
        expiration_time: NaiveDateTime,
    },
    Expired,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Hold {
    pub netid: String,
    pub state: HoldState,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl Hold {
    pub fn new(netid: &str, created_at: NaiveDateTime) -> Self {
        Self {
            netid: netid.to_string(),
            state: HoldState::Inactive,
            created_at,
        }
    }

    // an active hold whose deadline has not passed
    pub fn is_active(&self, now: NaiveDateTime) -> bool {
        matches!(self.state, HoldState::Active { expiration_time } if expiration_time > now)
    }

    // an active hold whose deadline has passed but which has not been marked expired yet
    pub fn is_lapsed(&self, now: NaiveDateTime) -> bool {
        matches!(self.state, HoldState::Active { expiration_time } if expiration_time <= now)
    }

    pub fn is_inactive(&self) -> bool {
        self.state == HoldState::Inactive
    }

    // live holds form the effective queue and are the only ones that block other patrons
    pub fn is_live(&self, now: NaiveDateTime) -> bool {
        self.is_inactive() || self.is_active(now)
    }

    // still awaiting a sweep: either queued or active, lapsed or not
    pub fn is_pending(&self) -> bool {
        self.state != HoldState::Expired
    }
}

// ResourceChargeList is the lending ledger of one work: its active charges and its FIFO hold queue.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ResourceChargeList {
    pub resource_id: String,
    pub version: i64,
    pub charged_items: Vec<ChargedItem>,
    pub hold_queue: Vec<Hold>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl ResourceChargeList {
    pub fn new(resource_id: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            version: 0,
            charged_items: vec![],
            hold_queue: vec![],
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    pub fn unexpired_charges(&self, now: NaiveDateTime) -> Vec<&ChargedItem> {
        self.charged_items.iter().filter(|c| !c.is_expired(now)).collect()
    }

    pub fn charge_for(&self, netid: &str, now: NaiveDateTime) -> Option<&ChargedItem> {
        self.charged_items.iter().find(|c| c.netid == netid && !c.is_expired(now))
    }

    pub fn is_charged(&self, item_id: &str, now: NaiveDateTime) -> bool {
        self.charged_items.iter().any(|c| c.item_id == item_id && !c.is_expired(now))
    }

    pub fn live_holds(&self, now: NaiveDateTime) -> Vec<&Hold> {
        self.hold_queue.iter().filter(|h| h.is_live(now)).collect()
    }

    pub fn hold_for(&self, netid: &str, now: NaiveDateTime) -> Option<&Hold> {
        self.hold_queue.iter().find(|h| h.netid == netid && h.is_live(now))
    }

    // 1-based place of the patron in the effective queue
    pub fn hold_position(&self, netid: &str, now: NaiveDateTime) -> Option<usize> {
        self.live_holds(now).iter().position(|h| h.netid == netid).map(|pos| pos + 1)
    }

    pub fn active_hold_count(&self, now: NaiveDateTime) -> usize {
        self.hold_queue.iter().filter(|h| h.is_active(now)).count()
    }

    pub fn pending_hold_count(&self) -> usize {
        self.hold_queue.iter().filter(|h| h.is_pending()).count()
    }

    // slots neither lent out nor reserved by an unlapsed active hold
    pub fn free_slots(&self, eligible_count: usize, now: NaiveDateTime) -> usize {
        eligible_count
            .saturating_sub(self.unexpired_charges(now).len())
            .saturating_sub(self.active_hold_count(now))
    }

    pub fn next_expiration(&self) -> Option<NaiveDateTime> {
        self.charged_items.iter().map(|c| c.expiration_time).min()
    }

    // netids still taking part in the ledger; expired holds no longer count
    pub fn patrons(&self) -> Vec<&str> {
        let mut netids: Vec<&str> = self.charged_items.iter().map(|c| c.netid.as_str())
            .chain(self.hold_queue.iter().filter(|h| h.is_pending()).map(|h| h.netid.as_str()))
            .collect();
        netids.sort_unstable();
        netids.dedup();
        netids
    }

    pub fn involves(&self, netid: &str) -> bool {
        self.charged_items.iter().any(|c| c.netid == netid)
            || self.hold_queue.iter().any(|h| h.netid == netid && h.is_pending())
    }

    // has work for the sweep: a pending hold or a charge past its expiration
    pub fn needs_sweep(&self, now: NaiveDateTime) -> bool {
        self.pending_hold_count() > 0 || self.charged_items.iter().any(|c| c.is_expired(now))
    }

    // the ledger as readers should see it: lapsed charges dropped and lapsed holds shown expired
    pub fn lazily_expired(&self, now: NaiveDateTime) -> Self {
        let mut view = self.clone();
        view.charged_items.retain(|c| !c.is_expired(now));
        for hold in view.hold_queue.iter_mut() {
            if hold.is_lapsed(now) {
                hold.state = HoldState::Expired;
            }
        }
        view
    }
}

impl Identifiable for ResourceChargeList {
    fn id(&self) -> String {
        self.resource_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}
