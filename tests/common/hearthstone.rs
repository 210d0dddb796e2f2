//! Game-side classes and singletons for query tests

use super::{FakeMono, Field, Ty};
use hearth_mirror::Address;

/// Card and deck classes shared by several screens
#[derive(Debug, Clone, Copy)]
pub struct CardClasses {
    pub premium: Address,
    pub deck_type: Address,
    pub card_set: Address,
    pub entity_def: Address,
    pub slot: Address,
    pub deck: Address,
}

pub fn card_classes(fake: &mut FakeMono) -> CardClasses {
    if let Some(deck) = fake.class_named("CollectionDeck") {
        return CardClasses {
            premium: fake.class_named("TAG_PREMIUM").unwrap(),
            deck_type: fake.class_named("DeckType").unwrap(),
            card_set: fake.class_named("TAG_CARD_SET").unwrap(),
            entity_def: fake.class_named("EntityDef").unwrap(),
            slot: fake.class_named("CollectionDeckSlot").unwrap(),
            deck,
        };
    }

    let object = fake.sys.object;
    let premium = fake.define_enum("", "TAG_PREMIUM");
    let deck_type = fake.define_enum("", "DeckType");
    let card_set = fake.define_enum("", "TAG_CARD_SET");
    let entity_def = fake.define_class(
        "",
        "EntityDef",
        Some(object),
        &[
            Field::new("m_cardId", Ty::Str),
            Field::new("m_tags", Ty::Generic),
        ],
    );
    let slot = fake.define_class(
        "",
        "CollectionDeckSlot",
        Some(object),
        &[
            Field::new("m_cardId", Ty::Str),
            Field::new("m_count", Ty::I4),
            Field::new("m_premium", Ty::Value(premium)),
        ],
    );
    let deck = fake.define_class(
        "",
        "CollectionDeck",
        Some(object),
        &[
            Field::new("ID", Ty::I8),
            Field::new("m_name", Ty::Str),
            Field::new("HeroCardID", Ty::Str),
            Field::new("m_slots", Ty::Generic),
            Field::new("m_isWild", Ty::Bool),
            Field::new("Type", Ty::Value(deck_type)),
            Field::literal("MAX_SLOTS", Ty::I4),
        ],
    );
    CardClasses {
        premium,
        deck_type,
        card_set,
        entity_def,
        slot,
        deck,
    }
}

#[derive(Debug, Clone)]
pub struct DeckSpec {
    pub id: i64,
    pub name: &'static str,
    pub hero: &'static str,
    pub wild: bool,
    pub deck_type: i32,
    pub cards: Vec<(&'static str, i32, bool)>,
}

impl DeckSpec {
    pub fn new(id: i64, name: &'static str, hero: &'static str) -> Self {
        DeckSpec {
            id,
            name,
            hero,
            wild: false,
            deck_type: 1,
            cards: Vec::new(),
        }
    }

    pub fn card(mut self, id: &'static str, count: i32) -> Self {
        self.cards.push((id, count, false));
        self
    }

    pub fn golden(mut self, id: &'static str, count: i32) -> Self {
        self.cards.push((id, count, true));
        self
    }

    pub fn wild(mut self) -> Self {
        self.wild = true;
        self
    }
}

pub fn deck(fake: &mut FakeMono, spec: &DeckSpec) -> Address {
    let classes = card_classes(fake);
    let slots: Vec<Address> = spec
        .cards
        .iter()
        .map(|(id, count, premium)| {
            let slot = fake.object(classes.slot);
            fake.set_str(slot, "m_cardId", id);
            fake.set_i32(slot, "m_count", *count);
            fake.set_i32(slot, "m_premium", *premium as i32);
            slot
        })
        .collect();
    let slots = fake.list(classes.slot, &slots);

    let deck = fake.object(classes.deck);
    fake.set_i64(deck, "ID", spec.id);
    fake.set_str(deck, "m_name", spec.name);
    fake.set_str(deck, "HeroCardID", spec.hero);
    fake.set_ptr(deck, "m_slots", slots);
    fake.set_bool(deck, "m_isWild", spec.wild);
    fake.set_i32(deck, "Type", spec.deck_type);
    deck
}

pub fn entity_def(fake: &mut FakeMono, card_id: &str) -> Address {
    let classes = card_classes(fake);
    let def = fake.object(classes.entity_def);
    fake.set_str(def, "m_cardId", card_id);
    def
}

/// `CollectionManager` with decks and owned cards
pub fn collection_manager(
    fake: &mut FakeMono,
    decks: &[DeckSpec],
    cards: &[(&str, i32, bool)],
) -> Address {
    let classes = card_classes(fake);
    let object = fake.sys.object;
    let collectible = fake.define_class(
        "",
        "CollectibleCard",
        Some(object),
        &[
            Field::new("m_EntityDef", Ty::Class(classes.entity_def)),
            Field::new("m_OwnedCount", Ty::I4),
            Field::new("m_PremiumType", Ty::Value(classes.premium)),
        ],
    );
    let (_, manager) = fake.singleton(
        "CollectionManager",
        &[
            Field::new("m_decks", Ty::Generic),
            Field::new("m_collectibleCards", Ty::Generic),
            Field::new("m_EditedDeck", Ty::Class(classes.deck)),
        ],
    );

    let entries: Vec<(i64, Address)> = decks.iter().map(|spec| (spec.id, deck(fake, spec))).collect();
    let dictionary = fake.dictionary(Ty::I8, classes.deck, &entries);
    fake.set_ptr(manager, "m_decks", dictionary);

    let owned: Vec<Address> = cards
        .iter()
        .map(|(id, count, premium)| {
            let card = fake.object(collectible);
            let def = entity_def(fake, id);
            fake.set_ptr(card, "m_EntityDef", def);
            fake.set_i32(card, "m_OwnedCount", *count);
            fake.set_i32(card, "m_PremiumType", *premium as i32);
            card
        })
        .collect();
    let owned = fake.list(collectible, &owned);
    fake.set_ptr(manager, "m_collectibleCards", owned);
    manager
}

pub fn deck_picker(fake: &mut FakeMono, selected: Option<i64>) -> Address {
    let object = fake.sys.object;
    let deck_box = fake.define_class(
        "",
        "CollectionDeckBoxVisual",
        Some(object),
        &[Field::new("m_deckID", Ty::I8), Field::new("m_isLocked", Ty::Bool)],
    );
    let (_, tray) = fake.singleton(
        "DeckPickerTrayDisplay",
        &[Field::new("m_selectedCustomDeckBox", Ty::Class(deck_box))],
    );
    if let Some(id) = selected {
        let visual = fake.object(deck_box);
        fake.set_i64(visual, "m_deckID", id);
        fake.set_ptr(tray, "m_selectedCustomDeckBox", visual);
    }
    tray
}

#[derive(Debug, Clone)]
pub struct SetSelection {
    pub all_standard: bool,
    pub wild: bool,
    pub sets: Vec<i32>,
}

pub fn collection_display(fake: &mut FakeMono, mana: i32, selection: &SetSelection) -> Address {
    let classes = card_classes(fake);
    let object = fake.sys.object;
    let tabs = fake.define_class(
        "",
        "ManaFilterTabManager",
        Some(object),
        &[Field::new("m_currentFilterValue", Ty::I4)],
    );
    let item = fake.define_class(
        "",
        "SetFilterItem",
        Some(object),
        &[
            Field::new("m_isAllStandard", Ty::Bool),
            Field::new("m_isWild", Ty::Bool),
            Field::new("m_cardSets", Ty::Generic),
            Field::new("m_iconTexture", Ty::Object),
        ],
    );
    let tray = fake.define_class(
        "",
        "SetFilterTray",
        Some(object),
        &[Field::new("m_selected", Ty::Class(item))],
    );
    let (_, display) = fake.singleton(
        "CollectionManagerDisplay",
        &[
            Field::new("m_manaTabManager", Ty::Class(tabs)),
            Field::new("m_setFilterTray", Ty::Class(tray)),
        ],
    );

    let tab_manager = fake.object(tabs);
    fake.set_i32(tab_manager, "m_currentFilterValue", mana);
    fake.set_ptr(display, "m_manaTabManager", tab_manager);

    let selected = fake.object(item);
    fake.set_bool(selected, "m_isAllStandard", selection.all_standard);
    fake.set_bool(selected, "m_isWild", selection.wild);
    let sets = fake.int_list(classes.card_set, &selection.sets);
    fake.set_ptr(selected, "m_cardSets", sets);
    let filter_tray = fake.object(tray);
    fake.set_ptr(filter_tray, "m_selected", selected);
    fake.set_ptr(display, "m_setFilterTray", filter_tray);
    display
}

#[derive(Debug, Clone)]
pub enum Reward {
    ArcaneDust(i32),
    Booster { id: i32, count: i32 },
    Card { id: &'static str, premium: bool, count: i32 },
    Gold(i32),
    Unknown,
}

fn backing(name: &str) -> String {
    format!("<{}>k__BackingField", name)
}

fn reward_object(fake: &mut FakeMono, base: Address, reward: &Reward) -> Address {
    let (class_name, fields): (&str, Vec<(&str, Ty)>) = match reward {
        Reward::ArcaneDust(_) => ("ArcaneDustRewardData", vec![("Amount", Ty::I4)]),
        Reward::Booster { .. } => ("BoosterPackRewardData", vec![("Id", Ty::I4), ("Count", Ty::I4)]),
        Reward::Card { .. } => (
            "CardRewardData",
            vec![("CardID", Ty::Str), ("Premium", Ty::I4), ("Count", Ty::I4)],
        ),
        Reward::Gold(_) => ("GoldRewardData", vec![("Amount", Ty::I4)]),
        Reward::Unknown => ("ForgeTicketRewardData", vec![("Quantity", Ty::I4)]),
    };
    let class = match fake.class_named(class_name) {
        Some(class) => class,
        None => {
            let fields: Vec<Field> = fields
                .iter()
                .map(|(name, ty)| Field::new(&backing(name), *ty))
                .collect();
            fake.define_class("", class_name, Some(base), &fields)
        }
    };

    let object = fake.object(class);
    match reward {
        Reward::ArcaneDust(amount) | Reward::Gold(amount) => {
            fake.set_i32(object, &backing("Amount"), *amount)
        }
        Reward::Booster { id, count } => {
            fake.set_i32(object, &backing("Id"), *id);
            fake.set_i32(object, &backing("Count"), *count);
        }
        Reward::Card { id, premium, count } => {
            fake.set_str(object, &backing("CardID"), id);
            fake.set_i32(object, &backing("Premium"), *premium as i32);
            fake.set_i32(object, &backing("Count"), *count);
        }
        Reward::Unknown => fake.set_i32(object, &backing("Quantity"), 3),
    }
    object
}

/// `DraftManager` during an arena run
pub fn draft_manager(
    fake: &mut FakeMono,
    spec: &DeckSpec,
    record: (i32, i32, i32),
    rewards: &[Reward],
) -> Address {
    let classes = card_classes(fake);
    let object = fake.sys.object;
    let base = fake.define_class(
        "",
        "RewardData",
        Some(object),
        &[Field::new("<Origin>k__BackingField", Ty::I4)],
    );
    let chest_class = fake.define_class(
        "",
        "RewardChest",
        Some(object),
        &[Field::new("<Rewards>k__BackingField", Ty::Generic)],
    );
    let (_, manager) = fake.singleton(
        "DraftManager",
        &[
            Field::new("m_draftDeck", Ty::Class(classes.deck)),
            Field::new("m_wins", Ty::I4),
            Field::new("m_losses", Ty::I4),
            Field::new("m_currentSlot", Ty::I4),
            Field::new("m_chest", Ty::Class(chest_class)),
        ],
    );

    let deck = deck(fake, spec);
    fake.set_ptr(manager, "m_draftDeck", deck);
    fake.set_i32(manager, "m_wins", record.0);
    fake.set_i32(manager, "m_losses", record.1);
    fake.set_i32(manager, "m_currentSlot", record.2);

    if !rewards.is_empty() {
        let items: Vec<Address> = rewards
            .iter()
            .map(|reward| reward_object(fake, base, reward))
            .collect();
        let list = fake.list(base, &items);
        let chest = fake.object(chest_class);
        fake.set_ptr(chest, "<Rewards>k__BackingField", list);
        fake.set_ptr(manager, "m_chest", chest);
    }
    manager
}

pub fn draft_display(fake: &mut FakeMono, choices: &[(&str, bool)]) -> Address {
    let classes = card_classes(fake);
    let object = fake.sys.object;
    let actor = fake.define_class(
        "",
        "Actor",
        Some(object),
        &[
            Field::new("m_entityDef", Ty::Class(classes.entity_def)),
            Field::new("m_premium", Ty::Value(classes.premium)),
        ],
    );
    let choice = fake.define_class(
        "",
        "DraftCardVisual",
        Some(object),
        &[Field::new("m_actor", Ty::Class(actor))],
    );
    let (_, display) = fake.singleton("DraftDisplay", &[Field::new("m_choices", Ty::Generic)]);

    let items: Vec<Address> = choices
        .iter()
        .map(|(id, premium)| {
            let def = entity_def(fake, id);
            let card_actor = fake.object(actor);
            fake.set_ptr(card_actor, "m_entityDef", def);
            fake.set_i32(card_actor, "m_premium", *premium as i32);
            let visual = fake.object(choice);
            fake.set_ptr(visual, "m_actor", card_actor);
            visual
        })
        .collect();
    let list = fake.list(choice, &items);
    fake.set_ptr(display, "m_choices", list);
    display
}

pub fn game_mgr(fake: &mut FakeMono, game_type: i32, format: i32, spectator: bool) -> Address {
    let game_type_enum = fake.define_enum("PegasusShared", "GameType");
    let format_enum = fake.define_enum("PegasusShared", "FormatType");
    let (_, manager) = fake.singleton(
        "GameMgr",
        &[
            Field::new("m_gameType", Ty::Value(game_type_enum)),
            Field::new("m_formatType", Ty::Value(format_enum)),
            Field::new("m_spectator", Ty::Bool),
        ],
    );
    fake.set_i32(manager, "m_gameType", game_type);
    fake.set_i32(manager, "m_formatType", format);
    fake.set_bool(manager, "m_spectator", spectator);
    manager
}

fn account_class(fake: &mut FakeMono) -> Address {
    if let Some(class) = fake.class_named("BnetGameAccountId") {
        return class;
    }
    let object = fake.sys.object;
    fake.define_class(
        "",
        "BnetGameAccountId",
        Some(object),
        &[Field::new("m_hi", Ty::U8), Field::new("m_lo", Ty::U8)],
    )
}

fn account_id(fake: &mut FakeMono, hi: u64, lo: u64) -> Address {
    let class = account_class(fake);
    let id = fake.object(class);
    fake.set_u64(id, "m_hi", hi);
    fake.set_u64(id, "m_lo", lo);
    id
}

#[derive(Debug, Clone)]
pub struct PlayerSpec {
    pub name: &'static str,
    pub id: i32,
    pub local: bool,
    pub card_back: i32,
    pub account: (u64, u64),
    pub standard: (i32, i32),
    pub wild: Option<(i32, i32)>,
}

pub fn game_state(fake: &mut FakeMono, players: &[PlayerSpec]) -> Address {
    let account = account_class(fake);
    let object = fake.sys.object;
    let medal = fake.define_class(
        "",
        "MedalInfoData",
        Some(object),
        &[Field::new("rank", Ty::I4), Field::new("legendIndex", Ty::I4)],
    );
    let translator = fake.define_class(
        "",
        "MedalInfoTranslator",
        Some(object),
        &[
            Field::new("m_currMedalInfo", Ty::Class(medal)),
            Field::new("m_currWildMedalInfo", Ty::Class(medal)),
        ],
    );
    let entity = fake.define_class(
        "",
        "Entity",
        Some(object),
        &[Field::new("m_tags", Ty::Generic)],
    );
    let player = fake.define_class(
        "",
        "Player",
        Some(entity),
        &[
            Field::new("m_name", Ty::Str),
            Field::new("m_id", Ty::I4),
            Field::new("m_local", Ty::Bool),
            Field::new("m_cardBackId", Ty::I4),
            Field::new("m_gameAccountId", Ty::Class(account)),
            Field::new("m_medalInfo", Ty::Class(translator)),
        ],
    );
    let (_, state) = fake.singleton("GameState", &[Field::new("m_playerMap", Ty::Generic)]);

    let mut entries = Vec::new();
    for spec in players {
        let medal_info = |fake: &mut FakeMono, (rank, legend): (i32, i32)| {
            let info = fake.object(medal);
            fake.set_i32(info, "rank", rank);
            fake.set_i32(info, "legendIndex", legend);
            info
        };
        let medals = fake.object(translator);
        let standard = medal_info(fake, spec.standard);
        fake.set_ptr(medals, "m_currMedalInfo", standard);
        if let Some(wild) = spec.wild {
            let wild = medal_info(fake, wild);
            fake.set_ptr(medals, "m_currWildMedalInfo", wild);
        }

        let object = fake.object(player);
        fake.set_str(object, "m_name", spec.name);
        fake.set_i32(object, "m_id", spec.id);
        fake.set_bool(object, "m_local", spec.local);
        fake.set_i32(object, "m_cardBackId", spec.card_back);
        let id = account_id(fake, spec.account.0, spec.account.1);
        fake.set_ptr(object, "m_gameAccountId", id);
        fake.set_ptr(object, "m_medalInfo", medals);
        entries.push((spec.id as i64, object));
    }
    let map = fake.dictionary(Ty::I4, player, &entries);
    fake.set_ptr(state, "m_playerMap", map);
    state
}

#[derive(Debug, Clone)]
pub struct ServerSpec {
    pub address: &'static str,
    pub port: i32,
    pub game_handle: i32,
    pub client_handle: i64,
    pub spectator_password: &'static str,
    pub resumable: bool,
    pub spectator_mode: bool,
}

pub fn network(fake: &mut FakeMono, server: Option<&ServerSpec>) -> Address {
    let object = fake.sys.object;
    let info = fake.define_class(
        "",
        "GameServerInfo",
        Some(object),
        &[
            Field::new(&backing("Address"), Ty::Str),
            Field::new(&backing("Port"), Ty::I4),
            Field::new(&backing("GameHandle"), Ty::I4),
            Field::new(&backing("ClientHandle"), Ty::I8),
            Field::new(&backing("SpectatorPassword"), Ty::Str),
            Field::new(&backing("Resumable"), Ty::Bool),
            Field::new(&backing("SpectatorMode"), Ty::Bool),
        ],
    );
    let (_, network) = fake.singleton(
        "Network",
        &[Field::new("m_lastGameServerInfo", Ty::Class(info))],
    );
    if let Some(server) = server {
        let object = fake.object(info);
        fake.set_str(object, &backing("Address"), server.address);
        fake.set_i32(object, &backing("Port"), server.port);
        fake.set_i32(object, &backing("GameHandle"), server.game_handle);
        fake.set_i64(object, &backing("ClientHandle"), server.client_handle);
        fake.set_str(object, &backing("SpectatorPassword"), server.spectator_password);
        fake.set_bool(object, &backing("Resumable"), server.resumable);
        fake.set_bool(object, &backing("SpectatorMode"), server.spectator_mode);
        fake.set_ptr(network, "m_lastGameServerInfo", object);
    }
    network
}

pub fn pack_opening(fake: &mut FakeMono, cards: &[(&str, bool)], last_booster: i32) -> Address {
    let classes = card_classes(fake);
    let object = fake.sys.object;
    let definition = fake.define_class(
        "",
        "CardDefinition",
        Some(object),
        &[
            Field::new(&backing("Name"), Ty::Str),
            Field::new(&backing("Premium"), Ty::Value(classes.premium)),
        ],
    );
    let booster = fake.define_class(
        "",
        "BoosterCard",
        Some(object),
        &[Field::new(&backing("Def"), Ty::Class(definition))],
    );
    let card = fake.define_class(
        "",
        "PackOpeningCard",
        Some(object),
        &[Field::new("m_boosterCard", Ty::Class(booster))],
    );
    let director = fake.define_class(
        "",
        "PackOpeningDirector",
        Some(object),
        &[Field::new("m_hiddenCards", Ty::Generic)],
    );
    let (_, opening) = fake.singleton(
        "PackOpening",
        &[
            Field::new("m_director", Ty::Class(director)),
            Field::new("m_lastOpenedBoosterId", Ty::I4),
        ],
    );

    let items: Vec<Address> = cards
        .iter()
        .map(|(id, premium)| {
            let def = fake.object(definition);
            fake.set_str(def, &backing("Name"), id);
            fake.set_i32(def, &backing("Premium"), *premium as i32);
            let booster_card = fake.object(booster);
            fake.set_ptr(booster_card, &backing("Def"), def);
            let pack_card = fake.object(card);
            fake.set_ptr(pack_card, "m_boosterCard", booster_card);
            pack_card
        })
        .collect();
    let hidden = fake.list(card, &items);
    let pack_director = fake.object(director);
    fake.set_ptr(pack_director, "m_hiddenCards", hidden);
    fake.set_ptr(opening, "m_director", pack_director);
    fake.set_i32(opening, "m_lastOpenedBoosterId", last_booster);
    opening
}

pub fn presence(fake: &mut FakeMono, account: Option<(u64, u64)>) -> Address {
    let class = account_class(fake);
    let (_, presence) = fake.singleton(
        "BnetPresenceMgr",
        &[Field::new("m_myGameAccountId", Ty::Class(class))],
    );
    if let Some((hi, lo)) = account {
        let id = account_id(fake, hi, lo);
        fake.set_ptr(presence, "m_myGameAccountId", id);
    }
    presence
}

pub fn chat(fake: &mut FakeMono, friends_list_open: bool) -> Address {
    let object = fake.sys.object;
    let frame = fake.define_class("", "FriendListFrame", Some(object), &[]);
    let (_, chat) = fake.singleton(
        "ChatMgr",
        &[Field::new("m_friendListFrame", Ty::Class(frame))],
    );
    if friends_list_open {
        let open = fake.object(frame);
        fake.set_ptr(chat, "m_friendListFrame", open);
    }
    chat
}
