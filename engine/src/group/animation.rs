/// Frame range of the gesture being played.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AnimationRange {
    pub start: u32,
    pub end: u32,
    pub fps: u32,
    pub looping: bool,
}

/// Frames to blend this tick.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AnimationStep {
    pub frame: u32,
    pub next_frame: u32,
    pub factor: f32,
    /// Set on the tick a non looping gesture reaches its last frame.
    pub ended: bool,
}

/// Playback position inside a gesture.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AnimationClock {
    pub frame: u32,
    pub factor: f64,
    frozen: bool,
}

impl AnimationClock {
    pub fn new(start: u32) -> Self {
        Self {
            frame: start,
            ..Default::default()
        }
    }

    pub fn reset(&mut self, start: u32) {
        *self = Self::new(start);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Moves the clock forward by `elapsed_ms`.
    ///
    /// `force_loop` overrides a gesture that would otherwise stop on its last frame.
    pub fn advance(&mut self, elapsed_ms: f64, range: AnimationRange, force_loop: bool) -> AnimationStep {
        let AnimationRange { start, end, fps, .. } = range;

        if fps == 0 || start >= end {
            self.frame = start;
            self.factor = 0.0;
            return AnimationStep {
                frame: start,
                next_frame: start,
                ..Default::default()
            };
        }

        if self.frame < start || self.frame > end {
            self.reset(start);
        }

        let mut frame = u64::from(self.frame);
        if !self.frozen {
            self.factor += elapsed_ms.max(0.0) / (1000.0 / fps as f64);

            if self.factor >= 1.0 {
                let whole = self.factor.floor();
                frame += whole.min(u32::MAX as f64) as u64;
                self.factor -= whole;
            }
        }

        if range.looping || force_loop {
            self.frozen = false;

            let len = u64::from(end - start) + 1;
            if frame > u64::from(end) {
                frame = u64::from(start) + (frame - u64::from(start)) % len;
            }
            self.frame = frame as u32;

            let next_frame = if self.frame >= end { start } else { self.frame + 1 };

            return AnimationStep {
                frame: self.frame,
                next_frame,
                factor: self.factor as f32,
                ended: false,
            };
        }

        if frame >= u64::from(end) {
            let ended = !self.frozen;
            self.frame = end;
            self.factor = 0.0;
            self.frozen = true;

            return AnimationStep {
                frame: end,
                next_frame: end,
                factor: 0.0,
                ended,
            };
        }

        self.frame = frame as u32;
        AnimationStep {
            frame: self.frame,
            next_frame: (self.frame + 1).min(end),
            factor: self.factor as f32,
            ended: false,
        }
    }
}
