//! Full-size viewer: position tracking, keyboard bindings and video playback state.

use api_client::{MediaId, MediaItem};

/// Access to a real media player. The viewer never trusts its own flags over
/// what the engine reports.
pub trait PlaybackEngine {
    fn is_paused(&self) -> bool;
    fn set_paused(&mut self, paused: bool);
    fn is_muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    /// True once the stream has played to its end.
    fn reached_end(&mut self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Playback {
    pub is_playing: bool,
    pub is_muted: bool,
}

impl Playback {
    /// Videos start playing, unmuted.
    pub fn autoplay() -> Self {
        Self {
            is_playing: true,
            is_muted: false,
        }
    }

    pub fn toggle_play(&mut self, engine: &mut dyn PlaybackEngine) {
        let paused = engine.is_paused();
        engine.set_paused(!paused);
        self.sync_from(engine);
    }

    pub fn toggle_mute(&mut self, engine: &mut dyn PlaybackEngine) {
        let muted = engine.is_muted();
        engine.set_muted(!muted);
        self.sync_from(engine);
    }

    pub fn sync_from(&mut self, engine: &dyn PlaybackEngine) {
        self.is_playing = !engine.is_paused();
        self.is_muted = engine.is_muted();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Closed,
    Open { index: usize, file_id: MediaId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Right,
    Left,
    Escape,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    Next,
    Prev,
    Close,
    TogglePlay,
}

#[derive(Debug)]
pub struct Viewer {
    state: ViewerState,
    playback: Playback,
    name_input: String,
    creating: bool,
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            state: ViewerState::Closed,
            playback: Playback::default(),
            name_input: String::new(),
            creating: false,
        }
    }
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ViewerState::Open { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match self.state {
            ViewerState::Open { index, .. } => Some(index),
            ViewerState::Closed => None,
        }
    }

    pub fn file_id(&self) -> Option<MediaId> {
        match self.state {
            ViewerState::Open { file_id, .. } => Some(file_id),
            ViewerState::Closed => None,
        }
    }

    pub fn current<'a>(&self, items: &'a [MediaItem]) -> Option<&'a MediaItem> {
        self.index().and_then(|i| items.get(i))
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    /// Open on `id`, resolved against the list as it is now.
    pub fn open(&mut self, items: &[MediaItem], id: MediaId) -> bool {
        match items.iter().position(|i| i.id == id) {
            Some(index) => {
                self.move_to(items, index);
                true
            }
            None => false,
        }
    }

    pub fn next(&mut self, items: &[MediaItem]) -> bool {
        match self.index() {
            Some(i) if i + 1 < items.len() => {
                self.move_to(items, i + 1);
                true
            }
            _ => false,
        }
    }

    pub fn prev(&mut self, items: &[MediaItem]) -> bool {
        match self.index() {
            Some(i) if i > 0 && i - 1 < items.len() => {
                self.move_to(items, i - 1);
                true
            }
            _ => false,
        }
    }

    pub fn close(&mut self) {
        self.state = ViewerState::Closed;
        self.playback = Playback::default();
        self.creating = false;
        self.name_input.clear();
    }

    /// Follow the open item through a refreshed list, closing if it is gone.
    ///
    /// Returns true if the viewer closed.
    pub fn reconcile(&mut self, items: &[MediaItem]) -> bool {
        let ViewerState::Open { index, file_id } = self.state else {
            return false;
        };
        match items.iter().position(|i| i.id == file_id) {
            Some(found) => {
                if found != index {
                    tracing::debug!(file_id, from = index, to = found, "Viewer item moved");
                    self.state = ViewerState::Open {
                        index: found,
                        file_id,
                    };
                }
                false
            }
            None => {
                tracing::debug!(file_id, "Viewer item vanished, closing");
                self.close();
                true
            }
        }
    }

    fn move_to(&mut self, items: &[MediaItem], index: usize) {
        let item = &items[index];
        self.state = ViewerState::Open {
            index,
            file_id: item.id,
        };
        self.playback = if item.is_video() {
            Playback::autoplay()
        } else {
            Playback::default()
        };
    }

    /// The action bound to `key`, if any. Space is only claimed while a video
    /// is open, so it stays free for text input otherwise.
    pub fn on_key(&self, key: ViewerKey, items: &[MediaItem]) -> Option<ViewerAction> {
        if !self.is_open() {
            return None;
        }
        match key {
            ViewerKey::Right => Some(ViewerAction::Next),
            ViewerKey::Left => Some(ViewerAction::Prev),
            ViewerKey::Escape => Some(ViewerAction::Close),
            ViewerKey::Space => self
                .current(items)
                .filter(|item| item.is_video())
                .map(|_| ViewerAction::TogglePlay),
        }
    }

    /// No-op unless the open item is a video.
    pub fn toggle_play(&mut self, items: &[MediaItem], engine: &mut dyn PlaybackEngine) {
        if self.current(items).is_some_and(MediaItem::is_video) {
            self.playback.toggle_play(engine);
        }
    }

    pub fn toggle_mute(&mut self, items: &[MediaItem], engine: &mut dyn PlaybackEngine) {
        if self.current(items).is_some_and(MediaItem::is_video) {
            self.playback.toggle_mute(engine);
        }
    }

    /// No engine could be started for the open video.
    pub fn stop_playback(&mut self) {
        self.playback = Playback::default();
    }

    pub fn sync_playback(&mut self, engine: &dyn PlaybackEngine) {
        if self.is_open() {
            self.playback.sync_from(engine);
        }
    }

    pub fn name_input(&self) -> &str {
        &self.name_input
    }

    pub fn set_name_input(&mut self, name: String) {
        self.name_input = name;
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn set_creating(&mut self, creating: bool) {
        self.creating = creating;
    }

    /// Called once a create request has succeeded.
    pub fn finish_create(&mut self) {
        self.creating = false;
        self.name_input.clear();
    }
}
