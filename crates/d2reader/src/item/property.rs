use crate::stats::{StatId, StatMap, display_value};

/// How one stat is rendered on an item tooltip
#[derive(Debug, Clone, Copy)]
enum Template {
    /// `+{value}{text}`
    Plus(&'static str),
    /// `+{value}%{text}`
    PlusPercent(&'static str),
    /// `{text} +{value}%`
    Trailing(&'static str),
    /// Not shown on tooltips
    Hidden,
}

fn template_of(id: u16) -> Option<Template> {
    use Template::*;

    let template = match id {
        StatId::STRENGTH => Plus(" to Strength"),
        StatId::ENERGY => Plus(" to Energy"),
        StatId::DEXTERITY => Plus(" to Dexterity"),
        StatId::VITALITY => Plus(" to Vitality"),
        StatId::MAX_LIFE => Plus(" to Life"),
        StatId::MAX_MANA => Plus(" to Mana"),
        StatId::DEFENSE => Plus(" Defense"),
        StatId::FIRE_RESIST => Trailing("Fire Resist"),
        StatId::MAX_FIRE_RESIST => PlusPercent(" to Maximum Fire Resist"),
        StatId::LIGHTNING_RESIST => Trailing("Lightning Resist"),
        StatId::MAX_LIGHTNING_RESIST => PlusPercent(" to Maximum Lightning Resist"),
        StatId::COLD_RESIST => Trailing("Cold Resist"),
        StatId::MAX_COLD_RESIST => PlusPercent(" to Maximum Cold Resist"),
        StatId::POISON_RESIST => Trailing("Poison Resist"),
        StatId::MAX_POISON_RESIST => PlusPercent(" to Maximum Poison Resist"),
        StatId::GOLD_FIND => PlusPercent(" Extra Gold from Monsters"),
        StatId::MAGIC_FIND => PlusPercent(" Better Chance of Getting Magic Items"),
        StatId::CLASS_SKILLS => Plus(" to Class Skill Levels"),
        StatId::INCREASED_ATTACK_SPEED => PlusPercent(" Increased Attack Speed"),
        StatId::FASTER_RUN_WALK => PlusPercent(" Faster Run/Walk"),
        StatId::FASTER_HIT_RECOVERY => PlusPercent(" Faster Hit Recovery"),
        StatId::FASTER_BLOCK_RATE => PlusPercent(" Faster Block Rate"),
        StatId::FASTER_CAST_RATE => PlusPercent(" Faster Cast Rate"),
        StatId::ALL_SKILLS => Plus(" to All Skills"),
        StatId::LIFE
        | StatId::MANA
        | StatId::LEVEL
        | StatId::EXPERIENCE
        | StatId::GOLD
        | StatId::STASH_GOLD
        | StatId::SOCKETS => Hidden,
        _ => return None,
    };
    Some(template)
}

/// Render one raw stat, or `None` for stats tooltips do not show
pub fn format_property(id: u16, raw: i32) -> Option<String> {
    let value = display_value(id, raw);
    let line = match template_of(id) {
        Some(Template::Plus(text)) => format!("{:+}{}", value, text),
        Some(Template::PlusPercent(text)) => format!("{:+}%{}", value, text),
        Some(Template::Trailing(text)) => format!("{} {:+}%", text, value),
        Some(Template::Hidden) => return None,
        None => format!("Stat {}: {}", id, value),
    };
    Some(line)
}

/// Tooltip lines for an item's stats, ordered by stat id
pub fn magical_properties(stats: &StatMap) -> Vec<String> {
    stats
        .iter()
        .filter_map(|(&id, &value)| format_property(id, value))
        .collect()
}
