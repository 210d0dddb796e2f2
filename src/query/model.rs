//! Detached result records returned by the query facade

use serde::{Deserialize, Serialize};

/// A card entry with its owned or slotted count
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub count: i32,
    pub premium: bool,
}

impl Card {
    pub fn new(id: impl Into<String>, count: i32, premium: bool) -> Self {
        Card {
            id: id.into(),
            count,
            premium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub hero: String,
    pub cards: Vec<Card>,
    pub is_wild: bool,
    pub deck_type: i32,
}

impl Deck {
    /// Total number of cards across all slots
    pub fn card_count(&self) -> i32 {
        self.cards.iter().map(|c| c.count).sum()
    }
}

/// Current arena run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArenaInfo {
    pub deck: Deck,
    pub wins: i32,
    pub losses: i32,
    pub current_slot: i32,
    pub rewards: Vec<RewardData>,
}

/// Two-part Battle.net game account id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AccountId {
    pub hi: u64,
    pub lo: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchPlayer {
    pub name: String,
    pub id: i32,
    pub standard_rank: i32,
    pub standard_legend_rank: i32,
    pub wild_rank: i32,
    pub wild_legend_rank: i32,
    pub card_back_id: i32,
    pub account_id: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchInfo {
    pub local_player: MatchPlayer,
    pub opposing_player: MatchPlayer,
}

/// Game server the client is connected to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    pub address: String,
    pub port: i32,
    pub game_handle: i32,
    pub client_handle: i64,
    pub spectator_password: String,
    pub resumable: bool,
    pub spectator_mode: bool,
}

/// Collection set filter selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "sets")]
pub enum SetFilter {
    AllStandard,
    Wild,
    Specific(Vec<i32>),
}

impl SetFilter {
    pub fn is_all_standard(&self) -> bool {
        matches!(self, SetFilter::AllStandard)
    }

    pub fn is_wild(&self) -> bool {
        matches!(self, SetFilter::Wild)
    }
}

/// Collection mana cost filter; the client stores -1 for "off"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManaFilter {
    Disabled,
    Cost(i32),
}

impl ManaFilter {
    pub fn from_raw(raw: i32) -> Self {
        if raw < 0 {
            ManaFilter::Disabled
        } else {
            ManaFilter::Cost(raw)
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            ManaFilter::Disabled => -1,
            ManaFilter::Cost(cost) => cost,
        }
    }
}

/// One reward from a reward chest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RewardData {
    ArcaneDust { amount: i32 },
    BoosterPack { id: i32, count: i32 },
    Card { id: String, premium: bool, count: i32 },
    Gold { amount: i32 },
}

/// Everything the poller prints per tick
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    pub game_type: Option<i32>,
    pub format_type: Option<i32>,
    pub spectating: bool,
    pub decks: Vec<Deck>,
    pub selected_deck: Option<i64>,
    pub arena: Option<ArenaInfo>,
    pub match_info: Option<MatchInfo>,
    pub account_id: Option<AccountId>,
}
