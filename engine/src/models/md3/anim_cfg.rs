use ahash::AHashMap;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::{
    error::ParseError,
    models::text::{content_lines, strip_comments},
};

/// Gesture lines of an `animation.cfg`, in file order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive)]
pub enum Md3Gesture {
    BothDeath1 = 0,
    BothDead1,
    BothDeath2,
    BothDead2,
    BothDeath3,
    BothDead3,
    TorsoGesture,
    TorsoAttack,
    TorsoAttack2,
    TorsoDrop,
    TorsoRaise,
    TorsoStand,
    TorsoStand2,
    LegsWalkCrouching,
    LegsWalk,
    LegsRun,
    LegsBack,
    LegsSwim,
    LegsJump,
    LegsLand,
    LegsJumpBack,
    LegsLandBack,
    LegsIdle,
    LegsIdleCrouching,
    LegsTurn,
}

impl Md3Gesture {
    pub const COUNT: usize = Md3Gesture::LegsTurn as usize + 1;

    pub fn from_index(index: usize) -> Option<Self> {
        Self::from_usize(index)
    }

    pub fn is_both(self) -> bool {
        self < Md3Gesture::TorsoGesture
    }

    pub fn is_torso(self) -> bool {
        (Md3Gesture::TorsoGesture..Md3Gesture::LegsWalkCrouching).contains(&self)
    }

    pub fn is_legs(self) -> bool {
        self >= Md3Gesture::LegsWalkCrouching
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Md3Sex {
    #[default]
    Unknown,
    Male,
    Female,
    Neuter,
}

/// Frame range of one gesture.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Md3AnimRange {
    pub gesture: Md3Gesture,
    pub start: u32,
    pub count: u32,
    pub looping_frames: u32,
    pub fps: u32,
}

impl Md3AnimRange {
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.count.saturating_sub(1))
    }

    pub fn looping(&self) -> bool {
        self.looping_frames != 0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Md3AnimConfig {
    pub sex: Md3Sex,
    pub head_offset: [f32; 3],
    pub footsteps: Option<String>,
    pub ranges: Vec<Md3AnimRange>,
}

impl Md3AnimConfig {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let stripped = strip_comments(text);
        let mut cfg = Self::default();

        for (line, content) in content_lines(&stripped) {
            let mut words = content.split_whitespace();
            let Some(keyword) = words.next() else {
                continue;
            };
            let rest: Vec<&str> = words.collect();

            match keyword.to_ascii_lowercase().as_str() {
                "sex" => {
                    cfg.sex = match rest.first().copied() {
                        Some("m") => Md3Sex::Male,
                        Some("f") => Md3Sex::Female,
                        Some("n") => Md3Sex::Neuter,
                        other => {
                            return Err(ParseError::config(line, format!("unknown sex {other:?}")))
                        }
                    }
                }
                "headoffset" => {
                    let values = parse_numbers::<f32>(line, rest.iter().copied())?;
                    let [x, y, z] = values[..] else {
                        return Err(ParseError::config(line, "headoffset needs 3 values"));
                    };
                    cfg.head_offset = [x, y, z];
                }
                "footsteps" => cfg.footsteps = rest.first().map(|s| s.to_string()),
                _ => {
                    let values = parse_numbers::<u32>(line, content.split_whitespace())?;
                    let [start, count, looping_frames, fps] = values[..] else {
                        return Err(ParseError::config(
                            line,
                            format!("expected 4 values, found {}", values.len()),
                        ));
                    };

                    if start.checked_add(count.saturating_sub(1)).is_none() {
                        return Err(ParseError::config(line, "frame range overflows"));
                    }

                    let gesture = Md3Gesture::from_index(cfg.ranges.len())
                        .ok_or_else(|| ParseError::config(line, "too many gestures"))?;

                    cfg.ranges.push(Md3AnimRange {
                        gesture,
                        start,
                        count,
                        looping_frames,
                        fps,
                    });
                }
            }
        }

        Ok(cfg)
    }

    pub fn range(&self, gesture: Md3Gesture) -> Option<&Md3AnimRange> {
        self.ranges.get(gesture as usize)
    }

    /// Ranges played by the upper body: shared and torso gestures.
    pub fn upper_ranges(&self) -> AHashMap<Md3Gesture, Md3AnimRange> {
        self.ranges
            .iter()
            .filter(|r| r.gesture.is_both() || r.gesture.is_torso())
            .map(|r| (r.gesture, *r))
            .collect()
    }

    /// Ranges played by the legs.
    ///
    /// Leg frames are numbered after the torso frames in the file but stored from the
    /// torso start in the lower model, so they are shifted back.
    pub fn lower_ranges(&self) -> AHashMap<Md3Gesture, Md3AnimRange> {
        let shift = match (
            self.range(Md3Gesture::LegsWalkCrouching),
            self.range(Md3Gesture::TorsoGesture),
        ) {
            (Some(legs), Some(torso)) => legs.start.saturating_sub(torso.start),
            _ => 0,
        };

        self.ranges
            .iter()
            .filter(|r| r.gesture.is_both() || r.gesture.is_legs())
            .map(|r| {
                let mut range = *r;
                if range.gesture.is_legs() {
                    range.start = range.start.saturating_sub(shift);
                }
                (range.gesture, range)
            })
            .collect()
    }
}

fn parse_numbers<'a, T: std::str::FromStr>(
    line: usize,
    words: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<T>, ParseError> {
    words
        .into_iter()
        .map(|word| {
            word.parse::<T>()
                .map_err(|_| ParseError::config(line, format!("{word:?} is not a number")))
        })
        .collect()
}


#[cfg(test)]
mod anim_cfg_tests {
    use super::{fixtures::animation_cfg, *};

    #[test]
    fn test_gesture_groups() {
        assert_eq!(Md3Gesture::COUNT, 25);
        assert!(Md3Gesture::BothDead3.is_both());
        assert!(Md3Gesture::TorsoStand2.is_torso());
        assert!(!Md3Gesture::TorsoStand2.is_legs());
        assert!(Md3Gesture::LegsWalkCrouching.is_legs());
        assert_eq!(Md3Gesture::from_index(24), Some(Md3Gesture::LegsTurn));
        assert_eq!(Md3Gesture::from_index(25), None);
    }

    #[test]
    fn test_parse() {
        let cfg = Md3AnimConfig::parse(&animation_cfg()).unwrap();

        assert_eq!(cfg.sex, Md3Sex::Male);
        assert_eq!(cfg.footsteps.as_deref(), Some("boot"));
        assert_eq!(cfg.ranges.len(), 25);

        let walk = cfg.range(Md3Gesture::LegsWalk).unwrap();
        assert_eq!((walk.start, walk.end(), walk.looping()), (28, 29, true));
    }

    #[test]
    fn test_distribution() {
        let cfg = Md3AnimConfig::parse(&animation_cfg()).unwrap();
        let upper = cfg.upper_ranges();
        let lower = cfg.lower_ranges();

        assert_eq!(upper.len(), 13);
        assert_eq!(lower.len(), 6 + 12);
        assert!(upper.contains_key(&Md3Gesture::BothDeath1));
        assert!(lower.contains_key(&Md3Gesture::BothDeath1));
        assert!(!upper.contains_key(&Md3Gesture::LegsRun));

        // legs shift back by start(LegsWalkCrouching) - start(TorsoGesture) = 26 - 12
        assert_eq!(lower[&Md3Gesture::LegsWalkCrouching].start, 12);
        assert_eq!(lower[&Md3Gesture::LegsWalk].start, 14);
        assert_eq!(upper[&Md3Gesture::TorsoStand].start, 22);
    }

    #[test]
    fn test_errors() {
        let mut text = animation_cfg();
        text.push_str("60 2 0 10\n");
        let err = Md3AnimConfig::parse(&text).unwrap_err();
        assert!(matches!(err, ParseError::BadConfig { line: 31, .. }));

        assert!(Md3AnimConfig::parse("sex x").is_err());
        assert!(Md3AnimConfig::parse("0 1 a 10").is_err());
        assert!(Md3AnimConfig::parse("fixedtorso").is_err());

        let err = Md3AnimConfig::parse("sex m\n4294967295 2 1 10").unwrap_err();
        assert!(matches!(err, ParseError::BadConfig { line: 2, .. }));
    }
}
