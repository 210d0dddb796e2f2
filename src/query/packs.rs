//! Booster pack opening

use super::model::Card;
use super::project::{child, int, objects, string};
use super::Mirror;
use crate::core::types::MirrorResult;

impl Mirror {
    /// Cards of the pack currently being opened
    pub fn get_pack_cards(&self) -> MirrorResult<Vec<Card>> {
        self.query("pack cards", |walker| {
            let Some(opening) = walker.root("PackOpening", "s_instance")? else {
                return Ok(Vec::new());
            };
            let Some(cards) = walker.follow(opening, &["m_director", "m_hiddenCards"])? else {
                return Ok(Vec::new());
            };
            let cards = walker.decode_object(cards)?;
            Ok(objects(&cards)
                .filter_map(|card| {
                    let def = child(card, "m_boosterCard")
                        .and_then(|booster| child(booster, "<Def>k__BackingField"))?;
                    let id = string(def, "<Name>k__BackingField")?;
                    let premium = int(def, "<Premium>k__BackingField").unwrap_or(0) != 0;
                    (!id.is_empty()).then(|| Card::new(id, 1, premium))
                })
                .collect())
        })
    }

    pub fn get_last_opened_booster_id(&self) -> MirrorResult<Option<i32>> {
        self.query("last booster", |walker| {
            let Some(opening) = walker.root("PackOpening", "s_instance")? else {
                return Ok(None);
            };
            Ok(walker
                .read_field(opening, "m_lastOpenedBoosterId")?
                .as_i64()
                .and_then(|id| i32::try_from(id).ok())
                .filter(|id| *id > 0))
        })
    }
}
