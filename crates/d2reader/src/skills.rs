use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::error::Result;
use crate::process::ReadMemory;
use crate::structs::{Skill, SkillInfo, SkillTxt, Unit, offsets};

/// Skill id → hard points
pub type SkillLevels = BTreeMap<u16, u32>;

pub struct SkillReader<'a, R: ReadMemory> {
    reader: &'a R,
}

impl<'a, R: ReadMemory> SkillReader<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// Walk the unit's learned-skill list.
    ///
    /// The walk stops at a null link, a node already seen, or after
    /// `skill::MAX_NODES` nodes. Skills with zero points are omitted.
    pub fn skill_levels(&self, unit: &Unit) -> Result<SkillLevels> {
        let info: SkillInfo = self.reader.read_struct(unit.skills)?;
        let mut levels = SkillLevels::new();
        let mut seen = HashSet::new();
        let mut current = info.first_skill;

        while current.is_valid() && seen.len() < offsets::skill::MAX_NODES {
            if !seen.insert(current) {
                debug!("Skill list loops back to {}", current);
                break;
            }
            let skill: Skill = self.reader.read_struct(current)?;
            if skill.level > 0 {
                let txt: SkillTxt = self.reader.read_struct(skill.skill_txt)?;
                levels.insert(txt.id, skill.level);
            }
            current = skill.next_skill;
        }

        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockMemoryBuilder, MockMemoryReader, RemoteAddress};
    use crate::structs::offsets::skill;

    fn write_skill(mem: &MockMemoryReader, node: u64, txt: u64, id: u16, level: u32, next: u64) {
        mem.write_zeroes(node, skill::SIZE);
        mem.write_u32(node + skill::SKILL_TXT as u64, txt as u32);
        mem.write_u32(node + skill::NEXT_SKILL as u64, next as u32);
        mem.write_u32(node + skill::LEVEL as u64, level);
        mem.write_u16(txt, id);
    }

    fn unit_with_skills(skills: u32) -> Unit {
        Unit {
            unit_type: 0,
            class_id: 1,
            unit_id: 1,
            mode: 0,
            unit_data: RemoteAddress::NULL,
            stat_list: RemoteAddress::NULL,
            inventory: RemoteAddress::NULL,
            skills: RemoteAddress::new(skills),
        }
    }

    #[test]
    fn test_skill_levels() {
        let mem = MockMemoryBuilder::new()
            .u32(0x1000, 0)
            .u32(0x1004, 0x2000)
            .build();
        write_skill(&mem, 0x2000, 0x5000, 36, 20, 0x2100);
        write_skill(&mem, 0x2100, 0x5010, 37, 0, 0x2200);
        write_skill(&mem, 0x2200, 0x5020, 54, 1, 0);

        let levels = SkillReader::new(&mem)
            .skill_levels(&unit_with_skills(0x1000))
            .unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[&36], 20);
        assert_eq!(levels[&54], 1);
    }

    #[test]
    fn test_cyclic_skill_list_terminates() {
        let mem = MockMemoryBuilder::new()
            .u32(0x1000, 0)
            .u32(0x1004, 0x2000)
            .build();
        write_skill(&mem, 0x2000, 0x5000, 36, 1, 0x2100);
        write_skill(&mem, 0x2100, 0x5010, 37, 2, 0x2000);

        let levels = SkillReader::new(&mem)
            .skill_levels(&unit_with_skills(0x1000))
            .unwrap();
        assert_eq!(levels.len(), 2);
    }
}
