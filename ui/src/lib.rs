//! Desktop gallery for the Cloud Sorter backend.

pub mod collections;
pub mod gallery;
mod image_loader;
mod style;
pub mod video;
pub mod viewer;
#[allow(dead_code)]
#[path = "../../app/src/config.rs"]
mod app_config;

pub use collections::{CollectionError, Created};
pub use gallery::{Fetched, GalleryState};
pub use image_loader::{ImageLoader, ImageLoaderError};
pub use video::PlayerFactory;
pub use viewer::{Playback, PlaybackEngine, Viewer, ViewerAction, ViewerKey, ViewerState};

use api_client::{Collection, CollectionId, GalleryBackend, MediaId, MediaItem, SyncSummary};
use app_config::AppConfig;
use iced::keyboard::{self, key, Key};
use iced::widget::image::Handle;
use iced::widget::{
    button, column, container, image, row, scrollable, text, text_input, Column, Row,
};
use iced::{
    executor, subscription, Alignment, Application, Command, Element, Length, Settings,
    Subscription, Theme,
};
use scan::{RequestSequence, ScanCoordinator, ScanEvent, ScanHandle, ScanSettings, ScanStop};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use style::Palette;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Duration};

const ERROR_DISPLAY_DURATION: Duration = Duration::from_secs(5);
const PLAYBACK_POLL: Duration = Duration::from_millis(500);
const GRID_COLUMNS: usize = 5;

pub struct UiFlags {
    pub backend: Arc<dyn GalleryBackend>,
    pub api_base_url: String,
    pub scan_settings: ScanSettings,
    /// Thumbnail downloads kept in flight while the grid fills.
    pub preload: usize,
    pub preload_threads: usize,
    pub cache_dir: PathBuf,
    pub player: PlayerFactory,
}

#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(flags)))]
pub fn run(flags: UiFlags) -> iced::Result {
    GalleryApp::run(Settings::with_flags(flags))
}

#[derive(Debug, Clone)]
pub enum Message {
    LoadMedia,
    MediaLoaded(Result<Fetched, String>),
    LoadCollections,
    CollectionsLoaded(Result<Vec<Collection>, String>),
    StartScan,
    ScanStarted(Result<ScanHandle, String>),
    CancelScan,
    Scan(ScanEvent),
    ThumbnailLoaded(String, Result<Handle, String>),
    FullImageLoaded(MediaId, Result<Handle, String>),
    ToggleSelect(MediaId),
    ClearSelection,
    OpenViewer(MediaId),
    CloseViewer,
    NextItem,
    PrevItem,
    Key(ViewerKey),
    TogglePlay,
    ToggleMute,
    PlaybackTick,
    ToggleMembership(CollectionId),
    Assigned(Result<Fetched, CollectionError>),
    NewCollectionNameChanged(String),
    CreateCollection,
    CollectionCreated(Result<Created, CollectionError>),
    SyncCollection(CollectionId),
    CollectionSynced(Result<SyncSummary, String>),
    DismissError(usize),
    ClearErrors,
    ShowSettings,
    CloseSettings,
    SettingsLogLevelChanged(String),
    SettingsApiBaseUrlChanged(String),
    SettingsLocalPathChanged(String),
    SaveSettings,
}

pub struct GalleryApp {
    backend: Arc<dyn GalleryBackend>,
    sequence: RequestSequence,
    coordinator: Arc<ScanCoordinator>,
    scan_handle: Option<ScanHandle>,
    scan_tx: mpsc::UnboundedSender<ScanEvent>,
    scan_rx: Arc<Mutex<mpsc::UnboundedReceiver<ScanEvent>>>,
    gallery: GalleryState,
    viewer: Viewer,
    engine: Option<Box<dyn PlaybackEngine>>,
    player: PlayerFactory,
    api_base_url: String,
    image_loader: Arc<ImageLoader>,
    thumbnails: HashMap<String, Handle>,
    requested_thumbnails: HashSet<String>,
    thumbnails_in_flight: usize,
    full_images: HashMap<MediaId, Handle>,
    preload_count: usize,
    loading: bool,
    syncing_collection: Option<CollectionId>,
    status: String,
    errors: Vec<String>,
    error_log_path: PathBuf,
    local_media_path: String,
    settings_open: bool,
    config_path: PathBuf,
    settings_log_level: String,
    settings_api_base_url: String,
    settings_local_path: String,
}

impl GalleryApp {
    pub fn item_count(&self) -> usize {
        self.gallery.items().len()
    }

    pub fn item_ids(&self) -> Vec<MediaId> {
        self.gallery.items().iter().map(|i| i.id).collect()
    }

    pub fn collection_count(&self) -> usize {
        self.gallery.collections().len()
    }

    pub fn is_selected(&self, id: MediaId) -> bool {
        self.gallery.is_selected(id)
    }

    pub fn selected_count(&self) -> usize {
        self.gallery.selection().len()
    }

    pub fn is_scanning(&self) -> bool {
        self.gallery.is_scanning()
    }

    pub fn has_scan_handle(&self) -> bool {
        self.scan_handle.is_some()
    }

    pub fn viewer_state(&self) -> ViewerState {
        self.viewer.state()
    }

    pub fn playback(&self) -> Playback {
        self.viewer.playback()
    }

    pub fn thumbnails_in_flight(&self) -> usize {
        self.thumbnails_in_flight
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Collections the open item belongs to, as last reported by the backend.
    pub fn open_memberships(&self) -> Vec<CollectionId> {
        self.viewer
            .current(self.gallery.items())
            .map(|item| item.collections.iter().map(|c| c.id).collect())
            .unwrap_or_default()
    }

    pub fn name_input(&self) -> String {
        self.viewer.name_input().to_string()
    }

    pub fn is_creating(&self) -> bool {
        self.viewer.is_creating()
    }

    pub fn syncing_collection(&self) -> Option<CollectionId> {
        self.syncing_collection
    }

    pub fn status(&self) -> String {
        self.status.clone()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn settings_log_level(&self) -> String {
        self.settings_log_level.clone()
    }

    pub fn settings_api_base_url(&self) -> String {
        self.settings_api_base_url.clone()
    }

    pub fn settings_local_path(&self) -> String {
        self.settings_local_path.clone()
    }

    fn log_error(&self, msg: &str) {
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.error_log_path)
        {
            let _ = writeln!(file, "{}", msg);
        }
    }

    fn error_timeout() -> Command<Message> {
        Command::perform(
            async {
                sleep(ERROR_DISPLAY_DURATION).await;
            },
            |_| Message::ClearErrors,
        )
    }

    fn push_error(&mut self, msg: String) -> Command<Message> {
        tracing::error!("{}", msg);
        self.log_error(&msg);
        self.errors.push(msg);
        GalleryApp::error_timeout()
    }

    /// Apply a fetched list and keep the viewer pointing at a valid item.
    fn apply_media(&mut self, seq: u64, items: Vec<MediaItem>) -> Command<Message> {
        if !self.gallery.apply_fetch(seq, items) {
            return Command::none();
        }
        if self.viewer.reconcile(self.gallery.items()) {
            self.engine = None;
        }
        self.request_thumbnails()
    }

    fn request_thumbnails(&mut self) -> Command<Message> {
        let budget = self.preload_count.saturating_sub(self.thumbnails_in_flight);
        let wanted: Vec<String> = self
            .gallery
            .items()
            .iter()
            .map(|i| i.file_hash.clone())
            .filter(|h| !self.requested_thumbnails.contains(h))
            .take(budget)
            .collect();

        let mut commands = Vec::new();
        for hash in wanted {
            if !self.requested_thumbnails.insert(hash.clone()) {
                continue;
            }
            self.thumbnails_in_flight += 1;
            let loader = self.image_loader.clone();
            commands.push(Command::perform(
                async move {
                    let result = loader.load_thumbnail(&hash).await.map_err(|e| e.to_string());
                    (hash, result)
                },
                |(hash, result)| Message::ThumbnailLoaded(hash, result),
            ));
        }
        Command::batch(commands)
    }

    fn stream_url(&self, id: MediaId) -> String {
        format!("{}/stream/{}", self.api_base_url.trim_end_matches('/'), id)
    }

    /// The viewer landed on a new item: swap the player or fetch the image.
    fn on_viewer_moved(&mut self) -> Command<Message> {
        self.engine = None;
        let Some(item) = self.viewer.current(self.gallery.items()).cloned() else {
            return Command::none();
        };
        if item.is_video() {
            self.engine = (self.player)(&self.stream_url(item.id));
            match self.engine.as_deref() {
                Some(engine) => self.viewer.sync_playback(engine),
                None => self.viewer.stop_playback(),
            }
            return Command::none();
        }
        if self.full_images.contains_key(&item.id) {
            return Command::none();
        }
        let loader = self.image_loader.clone();
        let id = item.id;
        Command::perform(
            async move { loader.load_full_image(id).await.map_err(|e| e.to_string()) },
            move |result| Message::FullImageLoaded(id, result),
        )
    }
}

impl Application for GalleryApp {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = UiFlags;

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(flags)))]
    fn new(flags: UiFlags) -> (Self, Command<Message>) {
        let UiFlags {
            backend,
            api_base_url,
            scan_settings,
            preload,
            preload_threads,
            cache_dir,
            player,
        } = flags;
        let error_log_path = cache_dir.join("ui_errors.log");
        let config_path = cache_dir.join("config");

        let sequence = RequestSequence::new();
        let coordinator = Arc::new(
            ScanCoordinator::new(backend.clone(), scan_settings).with_sequence(sequence.clone()),
        );
        let (scan_tx, scan_rx) = mpsc::unbounded_channel();
        let image_loader = Arc::new(ImageLoader::new(
            &api_base_url,
            cache_dir.clone(),
            preload_threads,
        ));

        let cfg = AppConfig::load_from(Some(config_path.clone()));
        let app = Self {
            backend,
            sequence,
            coordinator,
            scan_handle: None,
            scan_tx,
            scan_rx: Arc::new(Mutex::new(scan_rx)),
            gallery: GalleryState::new(),
            viewer: Viewer::new(),
            engine: None,
            player,
            api_base_url,
            image_loader,
            thumbnails: HashMap::new(),
            requested_thumbnails: HashSet::new(),
            thumbnails_in_flight: 0,
            full_images: HashMap::new(),
            preload_count: preload.max(1),
            loading: false,
            syncing_collection: None,
            status: "Idle".to_string(),
            errors: Vec::new(),
            error_log_path,
            local_media_path: cfg.local_media_path.clone(),
            settings_open: false,
            config_path,
            settings_log_level: cfg.log_level.clone(),
            settings_api_base_url: cfg.api_base_url.clone(),
            settings_local_path: cfg.local_media_path,
        };

        (
            app,
            Command::batch(vec![
                Command::perform(async {}, |_| Message::LoadMedia),
                Command::perform(async {}, |_| Message::LoadCollections),
            ]),
        )
    }

    fn title(&self) -> String {
        String::from("Cloud Sorter")
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::LoadMedia => {
                self.loading = true;
                let backend = self.backend.clone();
                let sequence = self.sequence.clone();
                return Command::perform(
                    async move {
                        gallery::refetch(backend.as_ref(), &sequence)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    Message::MediaLoaded,
                );
            }
            Message::MediaLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(fetched) => return self.apply_media(fetched.seq, fetched.items),
                    Err(e) => return self.push_error(format!("Failed to load media: {}", e)),
                }
            }
            Message::LoadCollections => {
                let backend = self.backend.clone();
                return Command::perform(
                    async move { backend.list_collections().await.map_err(|e| e.to_string()) },
                    Message::CollectionsLoaded,
                );
            }
            Message::CollectionsLoaded(result) => match result {
                Ok(collections) => self.gallery.set_collections(collections),
                Err(e) => return self.push_error(format!("Failed to load collections: {}", e)),
            },
            Message::StartScan => {
                if self.gallery.is_scanning() {
                    return Command::none();
                }
                self.gallery.set_scanning(true);
                self.status = "Starting scan...".into();
                let coordinator = self.coordinator.clone();
                let events = self.scan_tx.clone();
                return Command::perform(
                    async move { coordinator.start(events).await.map_err(|e| e.to_string()) },
                    Message::ScanStarted,
                );
            }
            Message::ScanStarted(result) => match result {
                // The loop may have finished before this message arrived.
                Ok(handle) if handle.is_finished() => {}
                Ok(handle) => {
                    self.scan_handle = Some(handle);
                }
                Err(e) => {
                    self.gallery.set_scanning(false);
                    self.status = "Scan failed".into();
                    return self.push_error(e);
                }
            },
            Message::CancelScan => {
                if let Some(handle) = &self.scan_handle {
                    handle.cancel();
                    self.status = "Cancelling scan...".into();
                }
            }
            Message::Scan(event) => match event {
                ScanEvent::Triggered(ack) => {
                    self.status = ack.message.unwrap_or_else(|| "Scan started".into());
                }
                ScanEvent::Polled { seq, items } => {
                    self.status = format!("Scanning: {} items", items.len());
                    return self.apply_media(seq, items);
                }
                ScanEvent::PollFailed { consecutive, error } => {
                    tracing::warn!(consecutive, "Poll failed: {}", error);
                    self.status = format!("Poll failed ({}x): {}", consecutive, error);
                }
                ScanEvent::Finished(stop) => {
                    self.gallery.set_scanning(false);
                    self.scan_handle = None;
                    match stop {
                        ScanStop::TimedOut => {
                            self.status = format!("Scan finished: {} items", self.gallery.items().len());
                        }
                        ScanStop::Cancelled => {
                            self.status = "Scan cancelled".into();
                        }
                        ScanStop::Aborted { failures } => {
                            self.status = "Scan aborted".into();
                            return self.push_error(format!(
                                "Scan aborted after {} failed polls",
                                failures
                            ));
                        }
                    }
                }
            },
            Message::ThumbnailLoaded(hash, result) => {
                self.thumbnails_in_flight = self.thumbnails_in_flight.saturating_sub(1);
                match result {
                    Ok(handle) => {
                        self.thumbnails.insert(hash, handle);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load thumbnail {}: {}", hash, e);
                    }
                }
                return self.request_thumbnails();
            }
            Message::FullImageLoaded(id, result) => match result {
                Ok(handle) => {
                    self.full_images.insert(id, handle);
                }
                Err(e) => return self.push_error(format!("Failed to load image: {}", e)),
            },
            Message::ToggleSelect(id) => {
                self.gallery.toggle_select(id);
            }
            Message::ClearSelection => {
                self.gallery.clear_selection();
            }
            Message::OpenViewer(id) => {
                if self.viewer.open(self.gallery.items(), id) {
                    return self.on_viewer_moved();
                }
            }
            Message::CloseViewer => {
                self.viewer.close();
                self.engine = None;
            }
            Message::NextItem => {
                if self.viewer.next(self.gallery.items()) {
                    return self.on_viewer_moved();
                }
            }
            Message::PrevItem => {
                if self.viewer.prev(self.gallery.items()) {
                    return self.on_viewer_moved();
                }
            }
            Message::Key(key) => {
                if self.settings_open && key == ViewerKey::Escape {
                    return self.update(Message::CloseSettings);
                }
                match self.viewer.on_key(key, self.gallery.items()) {
                    Some(ViewerAction::Next) => return self.update(Message::NextItem),
                    Some(ViewerAction::Prev) => return self.update(Message::PrevItem),
                    Some(ViewerAction::Close) => return self.update(Message::CloseViewer),
                    Some(ViewerAction::TogglePlay) => return self.update(Message::TogglePlay),
                    None => {}
                }
            }
            Message::TogglePlay => {
                if let Some(engine) = self.engine.as_deref_mut() {
                    self.viewer.toggle_play(self.gallery.items(), engine);
                }
            }
            Message::ToggleMute => {
                if let Some(engine) = self.engine.as_deref_mut() {
                    self.viewer.toggle_mute(self.gallery.items(), engine);
                }
            }
            Message::PlaybackTick => {
                if let Some(engine) = self.engine.as_deref_mut() {
                    if engine.reached_end() {
                        tracing::debug!("Video reached end of stream");
                    }
                    self.viewer.sync_playback(engine);
                }
            }
            Message::ToggleMembership(collection_id) => {
                let Some(file_id) = self.viewer.file_id() else {
                    return Command::none();
                };
                let backend = self.backend.clone();
                let sequence = self.sequence.clone();
                return Command::perform(
                    collections::assign(backend, sequence, file_id, collection_id),
                    Message::Assigned,
                );
            }
            Message::Assigned(result) => match result {
                Ok(fetched) => return self.apply_media(fetched.seq, fetched.items),
                Err(e) if e.backend_changed() => return self.push_error(e.to_string()),
                Err(e) => return self.push_error(format!("Failed to assign: {}", e)),
            },
            Message::NewCollectionNameChanged(name) => {
                self.viewer.set_name_input(name);
            }
            Message::CreateCollection => {
                if self.viewer.is_creating() {
                    return Command::none();
                }
                if let Err(e) = collections::validate_name(self.viewer.name_input()) {
                    return self.push_error(e.to_string());
                }
                let Some(file_id) = self.viewer.file_id() else {
                    return self.push_error(CollectionError::NothingOpen.to_string());
                };
                self.viewer.set_creating(true);
                let backend = self.backend.clone();
                let sequence = self.sequence.clone();
                let name = self.viewer.name_input().to_string();
                return Command::perform(
                    collections::create_and_assign(backend, sequence, name, Some(file_id)),
                    Message::CollectionCreated,
                );
            }
            Message::CollectionCreated(result) => match result {
                Ok(created) => {
                    self.viewer.finish_create();
                    self.status = format!("Created collection {}", created.collection.name);
                    self.gallery.set_collections(created.collections);
                    return self.apply_media(created.refreshed.seq, created.refreshed.items);
                }
                Err(e) => {
                    self.viewer.set_creating(false);
                    if !e.backend_changed() {
                        return self.push_error(format!("Failed to create collection: {}", e));
                    }
                    match &e {
                        CollectionError::AssignAfterCreate { collection, .. } => {
                            self.gallery.upsert_collection(collection.clone());
                        }
                        // Create and assign both went through.
                        _ => self.viewer.finish_create(),
                    }
                    let msg = e.to_string();
                    return Command::batch(vec![
                        self.push_error(msg),
                        Command::perform(async {}, |_| Message::LoadCollections),
                        Command::perform(async {}, |_| Message::LoadMedia),
                    ]);
                }
            },
            Message::SyncCollection(collection_id) => {
                if self.syncing_collection.is_some() {
                    return Command::none();
                }
                self.syncing_collection = Some(collection_id);
                let backend = self.backend.clone();
                return Command::perform(
                    collections::sync_collection(backend, collection_id),
                    |result| Message::CollectionSynced(result.map_err(|e| e.to_string())),
                );
            }
            Message::CollectionSynced(result) => {
                self.syncing_collection = None;
                match result {
                    Ok(summary) => {
                        self.status = format!(
                            "Synced: {} uploaded, {} shortcuts, {} errors",
                            summary.uploaded, summary.shortcuts, summary.errors
                        );
                        return Command::perform(async {}, |_| Message::LoadCollections);
                    }
                    Err(e) => return self.push_error(format!("Failed to sync collection: {}", e)),
                }
            }
            Message::DismissError(index) => {
                if index < self.errors.len() {
                    self.errors.remove(index);
                }
            }
            Message::ClearErrors => {
                self.errors.clear();
            }
            Message::ShowSettings => {
                self.settings_open = true;
                let cfg = AppConfig::load_from(Some(self.config_path.clone()));
                self.settings_log_level = cfg.log_level;
                self.settings_api_base_url = cfg.api_base_url;
                self.settings_local_path = cfg.local_media_path;
            }
            Message::CloseSettings => {
                self.settings_open = false;
            }
            Message::SettingsLogLevelChanged(val) => {
                self.settings_log_level = val;
            }
            Message::SettingsApiBaseUrlChanged(val) => {
                self.settings_api_base_url = val;
            }
            Message::SettingsLocalPathChanged(val) => {
                self.settings_local_path = val;
            }
            Message::SaveSettings => {
                let mut cfg = AppConfig::load_from(Some(self.config_path.clone()));
                cfg.log_level = self.settings_log_level.clone();
                cfg.api_base_url = self.settings_api_base_url.clone();
                cfg.local_media_path = self.settings_local_path.clone();
                if let Err(e) = cfg.save_to(Some(self.config_path.clone())) {
                    return self.push_error(format!("Failed to save settings: {}", e));
                }
                self.local_media_path = cfg.local_media_path;
                self.settings_open = false;
            }
        }
        Command::none()
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    fn subscription(&self) -> Subscription<Message> {
        let mut subs: Vec<Subscription<Message>> = Vec::new();

        let scan_rx = self.scan_rx.clone();
        subs.push(subscription::unfold("scan-events", scan_rx, |rx| async move {
            let next = {
                let mut lock = rx.lock().await;
                lock.recv().await
            };
            match next {
                Some(event) => (Message::Scan(event), rx),
                // The app holds a sender, so this only happens during shutdown.
                None => std::future::pending().await,
            }
        }));

        if self.viewer.is_open() || self.settings_open {
            subs.push(keyboard::on_key_press(map_key));
        }

        if self.engine.is_some() {
            subs.push(iced::time::every(PLAYBACK_POLL).map(|_| Message::PlaybackTick));
        }

        Subscription::batch(subs)
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    fn view(&self) -> Element<Message> {
        let scan_button = if self.gallery.is_scanning() {
            button("Cancel scan").on_press(Message::CancelScan)
        } else {
            button("Scan").on_press(Message::StartScan)
        };
        let folder = if self.local_media_path.is_empty() {
            "Folder: (backend default)".to_string()
        } else {
            format!("Folder: {}", self.local_media_path)
        };
        let selected = self.gallery.visible_selection().count();

        let header = row![
            text("Cloud Sorter").size(24),
            scan_button.style(style::button_primary()),
            button("Refresh")
                .style(style::button_primary())
                .on_press(Message::LoadMedia),
            button("Settings")
                .style(style::button_primary())
                .on_press(Message::ShowSettings),
            text(folder),
            text(self.status.clone()),
            text(format!("{} selected", selected)),
            button("Clear selection")
                .style(style::button_primary())
                .on_press_maybe((!self.gallery.selection().is_empty()).then_some(Message::ClearSelection)),
            text(format!("Errors: {}", self.errors.len())),
        ]
        .spacing(Palette::SPACING)
        .align_items(Alignment::Center);

        let error_banner = if self.errors.is_empty() {
            None
        } else {
            let mut list = Column::new().spacing(5);
            for (i, msg) in self.errors.iter().enumerate() {
                list = list.push(
                    row![
                        text(msg.clone()).size(16),
                        button("Dismiss")
                            .style(style::button_primary())
                            .on_press(Message::DismissError(i))
                    ]
                    .spacing(10)
                    .align_items(Alignment::Center),
                );
            }
            let banner = column![
                row![
                    text("Operation failed").size(16),
                    button("Dismiss All")
                        .style(style::button_primary())
                        .on_press(Message::ClearErrors)
                ]
                .spacing(10)
                .align_items(Alignment::Center),
                scrollable(list).height(Length::Fixed(100.0))
            ]
            .spacing(5);
            Some(
                container(banner)
                    .style(style::error_banner())
                    .padding(10)
                    .width(Length::Fill),
            )
        };

        let settings_dialog = if self.settings_open {
            Some(
                container(
                    column![
                        text("Settings").size(16),
                        text_input("Log level", &self.settings_log_level)
                            .on_input(Message::SettingsLogLevelChanged),
                        text_input("Backend URL", &self.settings_api_base_url)
                            .on_input(Message::SettingsApiBaseUrlChanged),
                        text_input("Local media folder", &self.settings_local_path)
                            .on_input(Message::SettingsLocalPathChanged),
                        text("Backend URL changes apply after restart.").size(12),
                        row![
                            button("Save")
                                .style(style::button_primary())
                                .on_press(Message::SaveSettings),
                            button("Cancel")
                                .style(style::button_primary())
                                .on_press(Message::CloseSettings)
                        ]
                        .spacing(10)
                    ]
                    .spacing(10),
                )
                .style(style::card())
                .padding(10),
            )
        } else {
            None
        };

        let content: Element<Message> = match self.viewer.current(self.gallery.items()) {
            Some(item) => self.viewer_view(item),
            None => self.grid_view(),
        };

        let mut base = column![].spacing(Palette::SPACING);
        if let Some(b) = error_banner {
            base = base.push(b);
        }
        base = base.push(header);
        if let Some(d) = settings_dialog {
            base = base.push(d);
        }
        base = base.push(content);

        container(base)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(20)
            .into()
    }
}

impl GalleryApp {
    fn grid_view(&self) -> Element<'_, Message> {
        let mut collections_row = Row::new().spacing(10).align_items(Alignment::Center);
        collections_row = collections_row.push(text("Collections:"));
        for collection in self.gallery.collections() {
            let label = match &collection.drive_folder_id {
                Some(_) => format!("{} (synced)", collection.name),
                None => collection.name.clone(),
            };
            let sync = if self.syncing_collection == Some(collection.id) {
                button("Syncing...")
            } else {
                button("Sync").on_press_maybe(
                    self.syncing_collection
                        .is_none()
                        .then_some(Message::SyncCollection(collection.id)),
                )
            };
            collections_row = collections_row
                .push(text(label))
                .push(sync.style(style::button_primary()));
        }

        let items = self.gallery.items();
        if items.is_empty() {
            let hint = if self.loading {
                "Loading media..."
            } else if self.gallery.is_scanning() {
                "Scanning, results will appear here..."
            } else {
                "No media found. Start a scan to discover your photos and videos."
            };
            return column![collections_row, text(hint).size(16)]
                .spacing(10)
                .into();
        }

        let mut rows = Column::new().spacing(10);
        for chunk in items.chunks(GRID_COLUMNS) {
            let mut current = Row::new().spacing(10);
            for item in chunk {
                current = current.push(self.tile(item));
            }
            rows = rows.push(current);
        }

        column![
            collections_row,
            text(format!("Found {} items", items.len())).size(16),
            scrollable(rows).height(Length::Fill),
        ]
        .spacing(10)
        .into()
    }

    fn tile(&self, item: &MediaItem) -> Element<'_, Message> {
        let thumb: Element<Message> = match self.thumbnails.get(&item.file_hash) {
            Some(handle) => image(handle.clone())
                .width(Length::Fixed(Palette::THUMB_SIZE))
                .height(Length::Fixed(Palette::THUMB_SIZE))
                .into(),
            None => container(text(item.file_name.clone()).size(12))
                .width(Length::Fixed(Palette::THUMB_SIZE))
                .height(Length::Fixed(Palette::THUMB_SIZE))
                .into(),
        };
        let selected = self.gallery.is_selected(item.id);
        let mark = if selected { "[x]" } else { "[ ]" };
        let kind = if item.is_video() { "video" } else { "" };
        column![
            button(thumb)
                .style(style::tile(selected))
                .on_press(Message::OpenViewer(item.id)),
            row![
                button(mark)
                    .style(style::button_primary())
                    .on_press(Message::ToggleSelect(item.id)),
                text(kind).size(12),
            ]
            .spacing(5)
            .align_items(Alignment::Center),
        ]
        .spacing(4)
        .into()
    }

    fn viewer_view(&self, item: &MediaItem) -> Element<'_, Message> {
        let index = self.viewer.index().unwrap_or(0);
        let len = self.gallery.items().len();

        let nav = row![
            button("< Prev")
                .style(style::button_primary())
                .on_press_maybe((index > 0).then_some(Message::PrevItem)),
            text(format!("{} / {}", index + 1, len)),
            button("Next >")
                .style(style::button_primary())
                .on_press_maybe((index + 1 < len).then_some(Message::NextItem)),
            button("Close")
                .style(style::button_primary())
                .on_press(Message::CloseViewer),
        ]
        .spacing(10)
        .align_items(Alignment::Center);

        let media: Element<Message> = if item.is_video() {
            if self.engine.is_some() {
                let playback = self.viewer.playback();
                column![
                    text("Video is playing in the player window.").size(16),
                    row![
                        button(if playback.is_playing { "Pause" } else { "Play" })
                            .style(style::button_primary())
                            .on_press(Message::TogglePlay),
                        button(if playback.is_muted { "Unmute" } else { "Mute" })
                            .style(style::button_primary())
                            .on_press(Message::ToggleMute),
                    ]
                    .spacing(10),
                ]
                .spacing(10)
                .into()
            } else {
                text("Video playback not available").size(16).into()
            }
        } else if let Some(handle) = self.full_images.get(&item.id) {
            image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
        } else {
            container(text("Loading..."))
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
        };

        let uploaded = if item.uploaded() {
            "Uploaded to cloud"
        } else {
            "Not uploaded"
        };
        let mut info = column![
            text(item.file_name.clone()).size(18),
            text(item.local_path.clone()).size(12),
            text(uploaded).size(12),
        ]
        .spacing(4);
        if let Some(created) = item.created_at {
            info = info.push(text(format!("Added {}", created.format("%Y-%m-%d %H:%M"))).size(12));
        }

        let mut memberships = Row::new().spacing(8).align_items(Alignment::Center);
        memberships = memberships.push(text("Collections:"));
        for collection in self.gallery.collections() {
            let label = if item.is_member_of(collection.id) {
                format!("* {}", collection.name)
            } else {
                collection.name.clone()
            };
            memberships = memberships.push(
                button(text(label))
                    .style(style::button_primary())
                    .on_press(Message::ToggleMembership(collection.id)),
            );
        }

        let creating = self.viewer.is_creating();
        let create_row = row![
            text_input("New collection", self.viewer.name_input())
                .on_input(Message::NewCollectionNameChanged)
                .on_submit(Message::CreateCollection),
            button(if creating { "Creating..." } else { "Create & add" })
                .style(style::button_primary())
                .on_press_maybe((!creating).then_some(Message::CreateCollection)),
        ]
        .spacing(10);

        column![nav, media, info, memberships, create_row]
            .spacing(10)
            .into()
    }
}

fn map_key(key: Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    let key = match key {
        Key::Named(key::Named::ArrowRight) => ViewerKey::Right,
        Key::Named(key::Named::ArrowLeft) => ViewerKey::Left,
        Key::Named(key::Named::Escape) => ViewerKey::Escape,
        Key::Named(key::Named::Space) => ViewerKey::Space,
        _ => return None,
    };
    Some(Message::Key(key))
}
