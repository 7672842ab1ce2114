use crate::{
    error::ParseError,
    models::text::{content_lines, strip_comments},
};

/// One gesture: a frame range with its playback rate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Md2Animation {
    pub start: u32,
    pub count: u32,
    pub looping: bool,
    pub fps: u32,
}

impl Md2Animation {
    /// Last frame of the range.
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.count.saturating_sub(1))
    }
}

/// Gesture table read from a text file of `start count loop fps` lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Md2Config {
    pub animations: Vec<Md2Animation>,
}

impl Md2Config {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let stripped = strip_comments(text);
        let mut animations = Vec::new();

        for (line, content) in content_lines(&stripped) {
            let values = content
                .split_whitespace()
                .map(|word| {
                    word.parse::<u32>()
                        .map_err(|_| ParseError::config(line, format!("{word:?} is not a number")))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let [start, count, looping, fps] = values[..] else {
                return Err(ParseError::config(
                    line,
                    format!("expected 4 values, found {}", values.len()),
                ));
            };

            if start.checked_add(count.saturating_sub(1)).is_none() {
                return Err(ParseError::config(line, "frame range overflows"));
            }

            animations.push(Md2Animation {
                start,
                count,
                looping: looping != 0,
                fps,
            });
        }

        Ok(Self { animations })
    }

    pub fn get(&self, gesture: usize) -> Option<&Md2Animation> {
        self.animations.get(gesture)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}
