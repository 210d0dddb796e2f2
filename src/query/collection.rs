//! Decks, collection and collection-screen filters

use super::model::{Card, Deck, ManaFilter, SetFilter};
use super::project::{boolean, child, dictionary_values, int, int32, items, objects, string};
use super::Mirror;
use crate::core::types::{MirrorResult, RemoteObject, RemoteValue};

impl Mirror {
    /// All decks known to the collection manager
    pub fn get_decks(&self) -> MirrorResult<Vec<Deck>> {
        self.query("decks", |walker| {
            let Some(manager) = walker.root("CollectionManager", "s_instance")? else {
                return Ok(Vec::new());
            };
            let Some(decks) = walker.follow(manager, &["m_decks"])? else {
                return Ok(Vec::new());
            };
            let decks = walker.decode_object(decks)?;
            Ok(dictionary_values(&decks)
                .into_iter()
                .filter_map(RemoteValue::as_object)
                .filter_map(deck_from)
                .collect())
        })
    }

    /// Id of the deck selected in the deck picker
    pub fn get_selected_deck_in_menu(&self) -> MirrorResult<Option<i64>> {
        self.query("selected deck", |walker| {
            let Some(tray) = walker.root("DeckPickerTrayDisplay", "s_instance")? else {
                return Ok(None);
            };
            let Some(deck_box) = walker.follow(tray, &["m_selectedCustomDeckBox"])? else {
                return Ok(None);
            };
            Ok(walker
                .read_field(deck_box, "m_deckID")?
                .as_i64()
                .filter(|id| *id > 0))
        })
    }

    /// Owned cards, one entry per card id and premium state
    pub fn get_collection(&self) -> MirrorResult<Vec<Card>> {
        self.query("collection", |walker| {
            let Some(manager) = walker.root("CollectionManager", "s_instance")? else {
                return Ok(Vec::new());
            };
            let Some(cards) = walker.follow(manager, &["m_collectibleCards"])? else {
                return Ok(Vec::new());
            };
            let cards = walker.decode_object(cards)?;
            Ok(objects(&cards)
                .filter_map(|card| {
                    let id = child(card, "m_EntityDef").and_then(|def| string(def, "m_cardId"))?;
                    let count = int32(card, "m_OwnedCount")?;
                    let premium = int(card, "m_PremiumType").unwrap_or(0) != 0;
                    (!id.is_empty() && count > 0).then(|| Card::new(id, count, premium))
                })
                .collect())
        })
    }

    /// Deck currently open in the deck editor
    pub fn get_edited_deck(&self) -> MirrorResult<Option<Deck>> {
        self.query("edited deck", |walker| {
            let Some(manager) = walker.root("CollectionManager", "s_instance")? else {
                return Ok(None);
            };
            let Some(deck) = walker.follow(manager, &["m_EditedDeck"])? else {
                return Ok(None);
            };
            let deck = walker.decode_object(deck)?;
            Ok(deck.as_object().and_then(deck_from))
        })
    }

    pub fn get_current_mana_filter(&self) -> MirrorResult<Option<ManaFilter>> {
        self.query("mana filter", |walker| {
            let Some(display) = walker.root("CollectionManagerDisplay", "s_instance")? else {
                return Ok(None);
            };
            let Some(tabs) = walker.follow(display, &["m_manaTabManager"])? else {
                return Ok(None);
            };
            Ok(walker
                .read_field(tabs, "m_currentFilterValue")?
                .as_i64()
                .and_then(|raw| i32::try_from(raw).ok())
                .map(ManaFilter::from_raw))
        })
    }

    pub fn get_current_set_filter(&self) -> MirrorResult<Option<SetFilter>> {
        self.query("set filter", |walker| {
            let Some(display) = walker.root("CollectionManagerDisplay", "s_instance")? else {
                return Ok(None);
            };
            let Some(item) = walker.follow(display, &["m_setFilterTray", "m_selected"])? else {
                return Ok(None);
            };
            let item = walker.decode_fields(item, &["m_isAllStandard", "m_isWild", "m_cardSets"])?;
            Ok(Some(set_filter_from(&item)))
        })
    }
}

/// Projects a `CollectionDeck`; decks without a valid id are dropped
pub(super) fn deck_from(deck: &RemoteObject) -> Option<Deck> {
    let id = int(deck, "ID").filter(|id| *id > 0)?;
    let cards = deck
        .field("m_slots")
        .map(|slots| {
            objects(slots)
                .filter_map(|slot| {
                    let id = string(slot, "m_cardId").filter(|id| !id.is_empty())?;
                    let count = int32(slot, "m_count").unwrap_or(0);
                    let premium = int(slot, "m_premium").unwrap_or(0) != 0;
                    Some(Card::new(id, count, premium))
                })
                .collect()
        })
        .unwrap_or_default();

    Some(Deck {
        id,
        name: string(deck, "m_name").unwrap_or_default(),
        hero: string(deck, "HeroCardID").unwrap_or_default(),
        cards,
        is_wild: boolean(deck, "m_isWild").unwrap_or(false),
        deck_type: int32(deck, "Type").unwrap_or(0),
    })
}

fn set_filter_from(item: &RemoteObject) -> SetFilter {
    if boolean(item, "m_isAllStandard").unwrap_or(false) {
        SetFilter::AllStandard
    } else if boolean(item, "m_isWild").unwrap_or(false) {
        SetFilter::Wild
    } else {
        let sets = item
            .field("m_cardSets")
            .map(|sets| {
                items(sets)
                    .iter()
                    .filter_map(RemoteValue::as_i64)
                    .filter_map(|set| i32::try_from(set).ok())
                    .collect()
            })
            .unwrap_or_default();
        SetFilter::Specific(sets)
    }
}
