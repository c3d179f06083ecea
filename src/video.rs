use crate::config::VideoConfig;
use crate::scene::MaterialRef;

/// Instruction for whatever owns the media element.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoCommand {
    /// Load `source` and, once it can play, start it at `rate`.
    Play { index: usize, source: String, rate: f64 },
    /// Pause and drop the current source.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoMode {
    On,
    Off,
}

impl VideoMode {
    /// Material every model should be drawn with in this mode.
    pub fn material(self) -> MaterialRef {
        match self {
            VideoMode::On => MaterialRef::Video,
            VideoMode::Off => MaterialRef::Fallback,
        }
    }
}

/// Selected video source plus the on/off toggle.
#[derive(Debug, Clone)]
pub struct VideoSelector {
    sources: Vec<String>,
    rate: f64,
    current: usize,
    mode: VideoMode,
}

impl VideoSelector {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            sources: config.sources.clone(),
            rate: config.playback_rate,
            current: 0,
            mode: VideoMode::On,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn mode(&self) -> VideoMode {
        self.mode
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Command that starts whatever is currently selected.
    pub fn play_current(&self) -> VideoCommand {
        VideoCommand::Play {
            index: self.current,
            source: self.sources[self.current].clone(),
            rate: self.rate,
        }
    }

    /// Switch to `index`. Out-of-range or unchanged selections are ignored;
    /// while off the index is remembered for the next toggle.
    pub fn select(&mut self, index: usize) -> Option<VideoCommand> {
        if index >= self.sources.len() || index == self.current {
            return None;
        }
        self.current = index;
        log::info!("video changed to: {}", self.sources[index]);
        match self.mode {
            VideoMode::On => Some(self.play_current()),
            VideoMode::Off => None,
        }
    }

    /// Advance to the next source, wrapping. With a single source the
    /// current one is restarted.
    pub fn select_next(&mut self) -> Option<VideoCommand> {
        if self.sources.len() == 1 {
            return match self.mode {
                VideoMode::On => Some(self.play_current()),
                VideoMode::Off => None,
            };
        }
        let index = (self.current + 1) % self.sources.len();
        self.select(index)
    }

    pub fn toggle(&mut self) -> VideoCommand {
        match self.mode {
            VideoMode::On => {
                self.mode = VideoMode::Off;
                VideoCommand::Stop
            }
            VideoMode::Off => {
                self.mode = VideoMode::On;
                self.play_current()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> VideoSelector {
        VideoSelector::new(&VideoConfig::default())
    }

    #[test]
    fn select_plays_new_index_only() {
        let mut v = selector();
        assert_eq!(v.select(0), None);
        assert_eq!(v.select(99), None);
        match v.select(2) {
            Some(VideoCommand::Play { index, source, rate }) => {
                assert_eq!(index, 2);
                assert_eq!(source, "./videos/video3.mp4");
                assert_eq!(rate, -10.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn next_wraps_around() {
        let mut v = selector();
        for _ in 0..4 {
            v.select_next();
        }
        assert_eq!(v.current(), 4);
        assert!(v.select_next().is_some());
        assert_eq!(v.current(), 0);
    }

    #[test]
    fn next_restarts_a_lone_source() {
        let mut v = VideoSelector::new(&VideoConfig {
            sources: vec!["./videos/only.mp4".to_string()],
            ..VideoConfig::default()
        });
        assert!(matches!(
            v.select_next(),
            Some(VideoCommand::Play { index: 0, .. })
        ));
        v.toggle();
        assert_eq!(v.select_next(), None);
    }

    #[test]
    fn toggle_resumes_last_selection() {
        let mut v = selector();
        v.select(3);
        assert_eq!(v.toggle(), VideoCommand::Stop);
        assert_eq!(v.mode().material(), MaterialRef::Fallback);
        // Selection while off is remembered but not played.
        assert_eq!(v.select(1), None);
        match v.toggle() {
            VideoCommand::Play { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(v.mode(), VideoMode::On);
    }
}
