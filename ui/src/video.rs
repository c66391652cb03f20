//! Video playback for the viewer.
//!
//! With the `gstreamer` feature a `playbin` streams `/stream/{id}` straight
//! from the backend. Without it, videos show a placeholder and no engine.

use crate::viewer::PlaybackEngine;

/// Builds an engine for a stream URL, or `None` when playback is unavailable.
pub type PlayerFactory = fn(&str) -> Option<Box<dyn PlaybackEngine>>;

#[cfg(feature = "gstreamer")]
pub use stream_player::StreamPlayer;

#[cfg(feature = "gstreamer")]
pub fn default_player(url: &str) -> Option<Box<dyn PlaybackEngine>> {
    match StreamPlayer::start(url) {
        Ok(player) => Some(Box::new(player)),
        Err(e) => {
            tracing::error!(url, "Failed to start video: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "gstreamer"))]
pub fn default_player(url: &str) -> Option<Box<dyn PlaybackEngine>> {
    tracing::debug!(url, "Video playback not compiled in");
    None
}

#[cfg(feature = "gstreamer")]
mod stream_player {
    use crate::viewer::PlaybackEngine;
    use gstreamer as gst;
    use gst::prelude::*;

    pub struct StreamPlayer {
        playbin: gst::Element,
    }

    impl StreamPlayer {
        pub fn start(uri: &str) -> Result<Self, String> {
            gst::init().map_err(|e| format!("GStreamer not available: {}", e))?;
            let playbin = gst::ElementFactory::make("playbin")
                .property("uri", uri)
                .build()
                .map_err(|e| format!("Missing playbin element: {}", e))?;
            playbin
                .set_state(gst::State::Playing)
                .map_err(|e| format!("Failed to start playback: {}. Missing codecs?", e))?;
            Ok(Self { playbin })
        }

        fn target_state(&self) -> gst::State {
            let (_, current, pending) = self.playbin.state(gst::ClockTime::ZERO);
            if pending == gst::State::VoidPending {
                current
            } else {
                pending
            }
        }
    }

    impl PlaybackEngine for StreamPlayer {
        fn is_paused(&self) -> bool {
            self.target_state() != gst::State::Playing
        }

        fn set_paused(&mut self, paused: bool) {
            let state = if paused {
                gst::State::Paused
            } else {
                gst::State::Playing
            };
            if let Err(e) = self.playbin.set_state(state) {
                tracing::warn!("Playback state change failed: {}", e);
            }
        }

        fn is_muted(&self) -> bool {
            self.playbin.property::<bool>("mute")
        }

        fn set_muted(&mut self, muted: bool) {
            self.playbin.set_property("mute", muted);
        }

        fn reached_end(&mut self) -> bool {
            let Some(bus) = self.playbin.bus() else {
                return false;
            };
            while let Some(msg) = bus.pop_filtered(&[gst::MessageType::Eos, gst::MessageType::Error]) {
                match msg.view() {
                    gst::MessageView::Eos(..) => {
                        let _ = self.playbin.set_state(gst::State::Paused);
                        return true;
                    }
                    gst::MessageView::Error(err) => {
                        tracing::error!("Video error: {}", err.error());
                        let _ = self.playbin.set_state(gst::State::Paused);
                        return true;
                    }
                    _ => {}
                }
            }
            false
        }
    }

    impl Drop for StreamPlayer {
        fn drop(&mut self) {
            let _ = self.playbin.set_state(gst::State::Null);
        }
    }
}
