//! Arena draft state

use super::collection::deck_from;
use super::model::{ArenaInfo, Card, RewardData};
use super::project::{child, int, int32, objects, string};
use super::Mirror;
use crate::core::types::{Address, MirrorResult, RemoteObject};
use crate::walker::Walker;
use tracing::debug;

impl Mirror {
    /// Current arena run, `None` outside of a draft
    pub fn get_arena_deck(&self) -> MirrorResult<Option<ArenaInfo>> {
        self.query("arena deck", |walker| {
            let Some(manager) = walker.root("DraftManager", "s_instance")? else {
                return Ok(None);
            };
            let Some(deck) = walker.follow(manager, &["m_draftDeck"])? else {
                return Ok(None);
            };
            let Some(deck) = walker.decode_object(deck)?.as_object().and_then(deck_from) else {
                return Ok(None);
            };

            let state = walker.decode_fields(manager, &["m_wins", "m_losses", "m_currentSlot"])?;
            let rewards = match chest_rewards(walker, manager) {
                Ok(rewards) => rewards,
                Err(e) if e.is_missing_data() => {
                    debug!(error = %e, "Reward chest unreadable");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            Ok(Some(ArenaInfo {
                deck,
                wins: int32(&state, "m_wins").unwrap_or(0),
                losses: int32(&state, "m_losses").unwrap_or(0),
                current_slot: int32(&state, "m_currentSlot").unwrap_or(0),
                rewards,
            }))
        })
    }

    /// Cards offered in the current draft pick
    pub fn get_arena_draft_choices(&self) -> MirrorResult<Vec<Card>> {
        self.query("draft choices", |walker| {
            let Some(display) = walker.root("DraftDisplay", "s_instance")? else {
                return Ok(Vec::new());
            };
            let Some(choices) = walker.follow(display, &["m_choices"])? else {
                return Ok(Vec::new());
            };
            let choices = walker.decode_object(choices)?;
            Ok(objects(&choices)
                .filter_map(|choice| {
                    let actor = child(choice, "m_actor")?;
                    let id = child(actor, "m_entityDef").and_then(|def| string(def, "m_cardId"))?;
                    let premium = int(actor, "m_premium").unwrap_or(0) != 0;
                    (!id.is_empty()).then(|| Card::new(id, 1, premium))
                })
                .collect())
        })
    }

    /// Rewards waiting in the arena chest
    pub fn get_arena_rewards(&self) -> MirrorResult<Vec<RewardData>> {
        self.query("arena rewards", |walker| {
            let Some(manager) = walker.root("DraftManager", "s_instance")? else {
                return Ok(Vec::new());
            };
            chest_rewards(walker, manager)
        })
    }
}

fn chest_rewards(walker: &mut Walker<'_>, manager: Address) -> MirrorResult<Vec<RewardData>> {
    match walker.follow(manager, &["m_chest", "<Rewards>k__BackingField"])? {
        Some(list) => Ok(rewards_from(&walker.decode_object(list)?)),
        None => Ok(Vec::new()),
    }
}

fn rewards_from(list: &crate::core::types::RemoteValue) -> Vec<RewardData> {
    objects(list).filter_map(reward_from).collect()
}

/// Maps a reward object by its concrete class; unknown kinds are skipped
fn reward_from(reward: &RemoteObject) -> Option<RewardData> {
    let backing = |name: &str| format!("<{}>k__BackingField", name);
    let number = |name: &str| int32(reward, &backing(name)).unwrap_or(0);

    match reward.short_name() {
        "ArcaneDustRewardData" => Some(RewardData::ArcaneDust {
            amount: number("Amount"),
        }),
        "BoosterPackRewardData" => Some(RewardData::BoosterPack {
            id: number("Id"),
            count: number("Count"),
        }),
        "CardRewardData" => Some(RewardData::Card {
            id: string(reward, &backing("CardID")).unwrap_or_default(),
            premium: number("Premium") != 0,
            count: number("Count"),
        }),
        "GoldRewardData" => Some(RewardData::Gold {
            amount: number("Amount"),
        }),
        other => {
            debug!(class = other, "Skipping unknown reward kind");
            None
        }
    }
}
