use serde::{Deserialize, Serialize};

/// Protectable action class inside a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionCategory {
    Build,
    Harvest,
    Container,
    Display,
    Vehicle,
    Sign,
    Redstone,
    Door,
    Trade,
    Husbandry,
    Detonate,
    Event,
    Sleep,
    View,
}

impl PermissionCategory {
    pub const ALL: [PermissionCategory; 14] = [
        PermissionCategory::Build,
        PermissionCategory::Harvest,
        PermissionCategory::Container,
        PermissionCategory::Display,
        PermissionCategory::Vehicle,
        PermissionCategory::Sign,
        PermissionCategory::Redstone,
        PermissionCategory::Door,
        PermissionCategory::Trade,
        PermissionCategory::Husbandry,
        PermissionCategory::Detonate,
        PermissionCategory::Event,
        PermissionCategory::Sleep,
        PermissionCategory::View,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionCategory::Build => "BUILD",
            PermissionCategory::Harvest => "HARVEST",
            PermissionCategory::Container => "CONTAINER",
            PermissionCategory::Display => "DISPLAY",
            PermissionCategory::Vehicle => "VEHICLE",
            PermissionCategory::Sign => "SIGN",
            PermissionCategory::Redstone => "REDSTONE",
            PermissionCategory::Door => "DOOR",
            PermissionCategory::Trade => "TRADE",
            PermissionCategory::Husbandry => "HUSBANDRY",
            PermissionCategory::Detonate => "DETONATE",
            PermissionCategory::Event => "EVENT",
            PermissionCategory::Sleep => "SLEEP",
            PermissionCategory::View => "VIEW",
        }
    }

    /// Case-insensitive lookup by configured name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(name))
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl std::fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of categories packed into one word. Copyable, so snapshots that hold
/// it can be shared freely between threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CategorySet(u16);

impl CategorySet {
    pub const fn empty() -> Self {
        CategorySet(0)
    }

    pub fn all() -> Self {
        PermissionCategory::ALL.into_iter().collect()
    }

    pub fn contains(self, category: PermissionCategory) -> bool {
        self.0 & category.bit() != 0
    }

    /// Returns `true` if the category was not present before.
    pub fn insert(&mut self, category: PermissionCategory) -> bool {
        let added = !self.contains(category);
        self.0 |= category.bit();
        added
    }

    /// Returns `true` if the category was present before.
    pub fn remove(&mut self, category: PermissionCategory) -> bool {
        let removed = self.contains(category);
        self.0 &= !category.bit();
        removed
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: CategorySet) -> CategorySet {
        CategorySet(self.0 | other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = PermissionCategory> {
        PermissionCategory::ALL
            .into_iter()
            .filter(move |category| self.contains(*category))
    }
}

impl FromIterator<PermissionCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = PermissionCategory>>(iter: I) -> Self {
        let mut set = CategorySet::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

/// Player interaction reported by the host game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    BreakBlock,
    PlaceBlock,
    PlaceFluid,
    PlaceEntity,
    DamageStaticEntity,
    FertilizeLand,
    StepOnFarmland,
    TeleportDragonEgg,
    FillBucket,
    ShearPumpkin,
    BreakPot,
    PushArmourStand,
    HarvestCrop,
    FertilizeCrop,
    OpenContainer,
    TakeLecternBook,
    ModifyBlock,
    ModifyStaticEntity,
    PlaceVehicle,
    DestroyVehicle,
    EditSign,
    DyeSign,
    UseRedstone,
    OpenDoor,
    TradeVillager,
    DamageAnimal,
    InteractWithAnimal,
    RodAnimal,
    DetachLead,
    UseBeehive,
    PotionAnimal,
    PushAnimal,
    PrimeTnt,
    DetonateEntity,
    DetonateBlock,
    TriggerRaid,
    SleepInBed,
    SetRespawnPoint,
    ViewLecternBook,
    PlayerDamage,
    ChatMessage,
    UseEnderPearl,
}

impl ActionType {
    /// Category guarding this action, or `None` for actions claims never
    /// restrict.
    pub fn category(self) -> Option<PermissionCategory> {
        use PermissionCategory as P;
        let category = match self {
            ActionType::BreakBlock
            | ActionType::PlaceBlock
            | ActionType::PlaceFluid
            | ActionType::PlaceEntity
            | ActionType::DamageStaticEntity
            | ActionType::FertilizeLand
            | ActionType::StepOnFarmland
            | ActionType::TeleportDragonEgg
            | ActionType::FillBucket
            | ActionType::ShearPumpkin
            | ActionType::BreakPot
            | ActionType::PushArmourStand => P::Build,
            ActionType::HarvestCrop | ActionType::FertilizeCrop => P::Harvest,
            ActionType::OpenContainer => P::Container,
            ActionType::TakeLecternBook
            | ActionType::ModifyBlock
            | ActionType::ModifyStaticEntity => P::Display,
            ActionType::PlaceVehicle | ActionType::DestroyVehicle => P::Vehicle,
            ActionType::EditSign | ActionType::DyeSign => P::Sign,
            ActionType::UseRedstone => P::Redstone,
            ActionType::OpenDoor => P::Door,
            ActionType::TradeVillager => P::Trade,
            ActionType::DamageAnimal
            | ActionType::InteractWithAnimal
            | ActionType::RodAnimal
            | ActionType::DetachLead
            | ActionType::UseBeehive
            | ActionType::PotionAnimal
            | ActionType::PushAnimal => P::Husbandry,
            ActionType::PrimeTnt | ActionType::DetonateEntity | ActionType::DetonateBlock => {
                P::Detonate
            }
            ActionType::TriggerRaid => P::Event,
            ActionType::SleepInBed | ActionType::SetRespawnPoint => P::Sleep,
            ActionType::ViewLecternBook => P::View,
            ActionType::PlayerDamage | ActionType::ChatMessage | ActionType::UseEnderPearl => {
                return None
            }
        };
        Some(category)
    }

    pub const MAPPED: [ActionType; 39] = [
        ActionType::BreakBlock,
        ActionType::PlaceBlock,
        ActionType::PlaceFluid,
        ActionType::PlaceEntity,
        ActionType::DamageStaticEntity,
        ActionType::FertilizeLand,
        ActionType::StepOnFarmland,
        ActionType::TeleportDragonEgg,
        ActionType::FillBucket,
        ActionType::ShearPumpkin,
        ActionType::BreakPot,
        ActionType::PushArmourStand,
        ActionType::HarvestCrop,
        ActionType::FertilizeCrop,
        ActionType::OpenContainer,
        ActionType::TakeLecternBook,
        ActionType::ModifyBlock,
        ActionType::ModifyStaticEntity,
        ActionType::PlaceVehicle,
        ActionType::DestroyVehicle,
        ActionType::EditSign,
        ActionType::DyeSign,
        ActionType::UseRedstone,
        ActionType::OpenDoor,
        ActionType::TradeVillager,
        ActionType::DamageAnimal,
        ActionType::InteractWithAnimal,
        ActionType::RodAnimal,
        ActionType::DetachLead,
        ActionType::UseBeehive,
        ActionType::PotionAnimal,
        ActionType::PushAnimal,
        ActionType::PrimeTnt,
        ActionType::DetonateEntity,
        ActionType::DetonateBlock,
        ActionType::TriggerRaid,
        ActionType::SleepInBed,
        ActionType::SetRespawnPoint,
        ActionType::ViewLecternBook,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(PermissionCategory::parse("build"), Some(PermissionCategory::Build));
        assert_eq!(PermissionCategory::parse(" Husbandry "), Some(PermissionCategory::Husbandry));
        assert_eq!(PermissionCategory::parse("FLY"), None);
    }

    #[test]
    fn category_set_tracks_changes() {
        let mut set = CategorySet::empty();
        assert!(set.insert(PermissionCategory::Door));
        assert!(!set.insert(PermissionCategory::Door));
        assert!(set.contains(PermissionCategory::Door));
        assert!(!set.contains(PermissionCategory::Build));
        assert!(set.remove(PermissionCategory::Door));
        assert!(!set.remove(PermissionCategory::Door));
        assert!(set.is_empty());
        assert_eq!(CategorySet::all().len(), 14);
    }

    #[test]
    fn duplicated_source_entries_resolve_to_later_category() {
        assert_eq!(ActionType::TriggerRaid.category(), Some(PermissionCategory::Event));
        assert_eq!(ActionType::SleepInBed.category(), Some(PermissionCategory::Sleep));
        assert_eq!(ActionType::SetRespawnPoint.category(), Some(PermissionCategory::Sleep));
        assert_eq!(ActionType::PrimeTnt.category(), Some(PermissionCategory::Detonate));
    }

    #[test]
    fn unmapped_actions_have_no_category() {
        assert_eq!(ActionType::PlayerDamage.category(), None);
        assert_eq!(ActionType::ChatMessage.category(), None);
        assert_eq!(ActionType::UseEnderPearl.category(), None);
        assert!(ActionType::MAPPED.iter().all(|action| action.category().is_some()));
    }

    #[test]
    fn every_category_has_at_least_one_action() {
        let covered: CategorySet = ActionType::MAPPED
            .iter()
            .filter_map(|action| action.category())
            .collect();
        assert_eq!(covered, CategorySet::all());
    }
}
