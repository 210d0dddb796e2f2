//! Logged-in account and social UI state

use super::game::account_from;
use super::model::AccountId;
use super::Mirror;
use crate::core::types::MirrorResult;

impl Mirror {
    /// Battle.net game account of the logged-in player
    pub fn get_account_id(&self) -> MirrorResult<Option<AccountId>> {
        self.query("account id", |walker| {
            let Some(presence) = walker.root("BnetPresenceMgr", "s_instance")? else {
                return Ok(None);
            };
            let Some(id) = walker.follow(presence, &["m_myGameAccountId"])? else {
                return Ok(None);
            };
            let id = walker.decode_fields(id, &["m_hi", "m_lo"])?;
            Ok(Some(account_from(&id)).filter(|id| id.hi != 0 || id.lo != 0))
        })
    }

    pub fn is_friends_list_visible(&self) -> MirrorResult<bool> {
        self.query("friends list", |walker| {
            let Some(chat) = walker.root("ChatMgr", "s_instance")? else {
                return Ok(false);
            };
            Ok(walker.follow(chat, &["m_friendListFrame"])?.is_some())
        })
    }
}
