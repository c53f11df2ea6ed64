//! Reveal choreography as a declarative timeline.
//!
//! Cues are scheduled at fixed offsets from the start of the reveal; nothing
//! here waits for a renderer to report that an animation actually finished.

use std::time::Duration;

const APPEAR_RISE_PX: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerTimings {
    pub appear_stagger: Duration,
    pub appear_duration: Duration,
    pub reveal_buffer: Duration,
    pub flip_stagger: Duration,
    pub flip_duration: Duration,
    pub reading_delay: Duration,
}

impl Default for SequencerTimings {
    fn default() -> Self {
        Self {
            appear_stagger: Duration::from_millis(200),
            appear_duration: Duration::from_millis(600),
            reveal_buffer: Duration::from_millis(500),
            flip_stagger: Duration::from_millis(800),
            flip_duration: Duration::from_millis(600),
            reading_delay: Duration::from_millis(600),
        }
    }
}

impl SequencerTimings {
    /// Every delay collapsed to zero, for headless runs.
    pub fn instant() -> Self {
        Self {
            appear_stagger: Duration::ZERO,
            appear_duration: Duration::ZERO,
            reveal_buffer: Duration::ZERO,
            flip_stagger: Duration::ZERO,
            flip_duration: Duration::ZERO,
            reading_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueEffect {
    Appear { slot: usize },
    Flip { slot: usize },
    ShowReading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub start: Duration,
    pub duration: Duration,
    pub effect: CueEffect,
}

impl Cue {
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }

    fn progress(&self, elapsed: Duration) -> f32 {
        if elapsed < self.start {
            return 0.0;
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        let into = elapsed - self.start;
        (into.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Interpolated look of one revealed card at a point in the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardFrame {
    pub opacity: f32,
    /// Remaining downward offset of the appear animation, in pixels.
    pub rise: f32,
    /// 0.0 face down, 1.0 face up.
    pub flip: f32,
}

impl CardFrame {
    pub fn face_up(&self) -> bool {
        self.flip >= 0.5
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Timeline {
    cues: Vec<Cue>,
}

impl Timeline {
    /// Appear phase (card i at `i * appear_stagger`), then, once every
    /// appear is scheduled to be done, flips at `i * flip_stagger`, then the
    /// reading text `reading_delay` after the last flip starts.
    pub fn reveal(card_count: usize, timings: &SequencerTimings) -> Self {
        let mut cues = Vec::with_capacity(card_count * 2 + 1);

        for slot in 0..card_count {
            cues.push(Cue {
                start: timings.appear_stagger * slot as u32,
                duration: timings.appear_duration,
                effect: CueEffect::Appear { slot },
            });
        }

        let flips_start = timings.appear_stagger * card_count as u32 + timings.reveal_buffer;
        for slot in 0..card_count {
            cues.push(Cue {
                start: flips_start + timings.flip_stagger * slot as u32,
                duration: timings.flip_duration,
                effect: CueEffect::Flip { slot },
            });
        }

        let reading_start = match card_count {
            0 => flips_start,
            n => flips_start + timings.flip_stagger * (n - 1) as u32 + timings.reading_delay,
        };
        cues.push(Cue {
            start: reading_start,
            duration: Duration::ZERO,
            effect: CueEffect::ShowReading,
        });

        cues.sort_by_key(|cue| cue.start);
        Self { cues }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.cues
            .iter()
            .map(Cue::end)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn reading_at(&self) -> Option<Duration> {
        self.cues
            .iter()
            .find(|cue| cue.effect == CueEffect::ShowReading)
            .map(|cue| cue.start)
    }

    pub fn frame(&self, slot: usize, elapsed: Duration) -> CardFrame {
        let mut frame = CardFrame {
            opacity: 0.0,
            rise: APPEAR_RISE_PX,
            flip: 0.0,
        };
        for cue in &self.cues {
            match cue.effect {
                CueEffect::Appear { slot: s } if s == slot => {
                    let progress = cue.progress(elapsed);
                    frame.opacity = progress;
                    frame.rise = APPEAR_RISE_PX * (1.0 - progress);
                }
                CueEffect::Flip { slot: s } if s == slot => {
                    frame.flip = cue.progress(elapsed);
                }
                _ => {}
            }
        }
        frame
    }
}

/// Fires each cue once, in start order, as time advances.
#[derive(Debug, Clone)]
pub struct TimelinePlayer {
    timeline: Timeline,
    next: usize,
}

impl TimelinePlayer {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline, next: 0 }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Effects whose start is at or before `elapsed` and that have not
    /// fired yet.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<CueEffect> {
        let due = self.timeline.cues[self.next..]
            .iter()
            .take_while(|cue| cue.start <= elapsed)
            .map(|cue| cue.effect)
            .collect::<Vec<_>>();
        self.next += due.len();
        due
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.timeline.cues.len()
    }
}

/// Runs the timeline against the tokio clock, handing each cue to `sink`
/// when its start offset is reached.
pub async fn play<F>(timeline: &Timeline, mut sink: F)
where
    F: FnMut(&Cue),
{
    let started = tokio::time::Instant::now();
    for cue in timeline.cues() {
        tokio::time::sleep_until(started + cue.start).await;
        tracing::debug!(effect = ?cue.effect, at_ms = cue.start.as_millis() as u64, "reveal cue");
        sink(cue);
    }
}

#[cfg(test)]
#[path = "tests/sequencer_tests.rs"]
mod tests;
