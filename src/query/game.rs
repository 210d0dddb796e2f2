//! Game mode, match participants and server connection

use super::model::{AccountId, MatchInfo, MatchPlayer, ServerInfo};
use super::project::{boolean, child, dictionary_values, int, int32, string, unsigned};
use super::Mirror;
use crate::core::types::{MirrorResult, RemoteObject, RemoteValue};

impl Mirror {
    /// Raw `GameType` of the current or last game
    pub fn get_game_type(&self) -> MirrorResult<Option<i32>> {
        self.game_manager_field("game type", "m_gameType")
            .map(|value| value.and_then(|v| i32::try_from(v).ok()))
    }

    /// Raw `FormatType` of the current or last game
    pub fn get_format(&self) -> MirrorResult<Option<i32>> {
        self.game_manager_field("format", "m_formatType")
            .map(|value| value.and_then(|v| i32::try_from(v).ok()))
    }

    pub fn is_spectating(&self) -> MirrorResult<bool> {
        self.game_manager_field("spectating", "m_spectator")
            .map(|value| value.is_some_and(|v| v != 0))
    }

    fn game_manager_field(&self, name: &str, field: &str) -> MirrorResult<Option<i64>> {
        self.query(name, |walker| {
            let Some(manager) = walker.root("GameMgr", "s_instance")? else {
                return Ok(None);
            };
            Ok(walker.read_field(manager, field)?.as_i64())
        })
    }

    /// Both players of the running game. `None` until the opponent is known.
    pub fn get_match_info(&self) -> MirrorResult<Option<MatchInfo>> {
        self.query("match info", |walker| {
            let Some(state) = walker.root("GameState", "s_instance")? else {
                return Ok(None);
            };
            let Some(players) = walker.follow(state, &["m_playerMap"])? else {
                return Ok(None);
            };
            let players = walker.decode_object(players)?;
            let players: Vec<&RemoteObject> = dictionary_values(&players)
                .into_iter()
                .filter_map(RemoteValue::as_object)
                .collect();

            let local = players
                .iter()
                .find(|p| boolean(p, "m_local").unwrap_or(false));
            let opposing = players
                .iter()
                .find(|p| !boolean(p, "m_local").unwrap_or(false));
            Ok(match (local, opposing) {
                (Some(local), Some(opposing)) => Some(MatchInfo {
                    local_player: player_from(local),
                    opposing_player: player_from(opposing),
                }),
                _ => None,
            })
        })
    }

    /// Connection details of the last game server
    pub fn get_server_info(&self) -> MirrorResult<Option<ServerInfo>> {
        self.query("server info", |walker| {
            let Some(network) = walker.root("Network", "s_instance")? else {
                return Ok(None);
            };
            let Some(info) = walker.follow(network, &["m_lastGameServerInfo"])? else {
                return Ok(None);
            };
            let info = walker.decode_object(info)?;
            Ok(info.as_object().map(server_from))
        })
    }
}

pub(super) fn account_from(id: &RemoteObject) -> AccountId {
    AccountId {
        hi: unsigned(id, "m_hi").unwrap_or(0),
        lo: unsigned(id, "m_lo").unwrap_or(0),
    }
}

fn player_from(player: &RemoteObject) -> MatchPlayer {
    let medals = child(player, "m_medalInfo");
    let medal = |name: &str, field: &str| {
        medals
            .and_then(|m| child(m, name))
            .and_then(|m| int32(m, field))
            .unwrap_or(0)
    };

    MatchPlayer {
        name: string(player, "m_name").unwrap_or_default(),
        id: int32(player, "m_id").unwrap_or(0),
        standard_rank: medal("m_currMedalInfo", "rank"),
        standard_legend_rank: medal("m_currMedalInfo", "legendIndex"),
        wild_rank: medal("m_currWildMedalInfo", "rank"),
        wild_legend_rank: medal("m_currWildMedalInfo", "legendIndex"),
        card_back_id: int32(player, "m_cardBackId").unwrap_or(0),
        account_id: child(player, "m_gameAccountId")
            .map(account_from)
            .unwrap_or_default(),
    }
}

fn server_from(info: &RemoteObject) -> ServerInfo {
    let backing = |name: &str| format!("<{}>k__BackingField", name);
    ServerInfo {
        address: string(info, &backing("Address")).unwrap_or_default(),
        port: int32(info, &backing("Port")).unwrap_or(0),
        game_handle: int32(info, &backing("GameHandle")).unwrap_or(0),
        client_handle: int(info, &backing("ClientHandle")).unwrap_or(0),
        spectator_password: string(info, &backing("SpectatorPassword")).unwrap_or_default(),
        resumable: boolean(info, &backing("Resumable")).unwrap_or(false),
        spectator_mode: boolean(info, &backing("SpectatorMode")).unwrap_or(false),
    }
}
